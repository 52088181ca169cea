//! Drag and drop routing for source lists.
//!
//! A [`DragRouter`] receives the drag events of a surface, decides where the
//! dragged fields would land and either reports the region to highlight
//! (while hovering) or adds the fields to the engine (on drop).
//!
//! Fields dropped onto an item whose type declares a parent key become its
//! children if any of them fits a child type of that key. Fields dropped
//! anywhere else inside the list are appended as top-level items.
//!
//! ```
//! use horizon_sourcelist::catalog::{TypeCatalog, TypeDefinition};
//! use horizon_sourcelist::drag::{DragEvent, DragOutcome, DragRouter, ListLayout};
//! use horizon_sourcelist::model::SourceListEngine;
//! use horizon_sourcelist_core::{Point, Rect};
//!
//! struct Layout;
//! impl ListLayout for Layout {
//!     fn list_bounds(&self) -> Rect { Rect::new(0.0, 0.0, 200.0, 400.0) }
//!     fn item_bounds(&self, index: usize) -> Option<Rect> {
//!         Some(Rect::new(0.0, index as f32 * 20.0, 200.0, 20.0))
//!     }
//! }
//!
//! let catalog = TypeCatalog::new(vec![TypeDefinition::new("a", "A", ["Number"])], false).unwrap();
//! let mut engine = SourceListEngine::new(catalog);
//! let source = |_: &str| Some("Number".to_string());
//!
//! let mut router = DragRouter::new();
//! let drop = DragEvent::drop(Point::new(100.0, 300.0), ["/Speed"]);
//! let outcome = router.handle(&mut engine, &drop, &Layout, &source);
//! assert!(matches!(outcome, DragOutcome::Dropped { .. }));
//! assert_eq!(engine.len(), 1);
//! ```

use std::collections::BTreeSet;

use horizon_sourcelist_core::logging::targets;
use horizon_sourcelist_core::{Point, Rect, Signal};

use crate::model::{ItemId, SourceListEngine};
use crate::source::LogDataSource;

/// Phase of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// The pointer moved while dragging.
    Hover,
    /// The dragged fields were released.
    Drop,
}

/// A drag event delivered to a source list.
#[derive(Debug, Clone, PartialEq)]
pub struct DragEvent {
    pub phase: DragPhase,
    /// Pointer position in the coordinates of the [`ListLayout`].
    pub pointer: Point,
    /// Keys of the dragged fields.
    pub field_keys: Vec<String>,
}

impl DragEvent {
    pub fn new<I, S>(phase: DragPhase, pointer: Point, field_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phase,
            pointer,
            field_keys: field_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a hover event.
    pub fn hover<I, S>(pointer: Point, field_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(DragPhase::Hover, pointer, field_keys)
    }

    /// Creates a drop event.
    pub fn drop<I, S>(pointer: Point, field_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(DragPhase::Drop, pointer, field_keys)
    }
}

/// On-screen geometry of a source list.
pub trait ListLayout {
    /// Bounds of the whole list.
    fn list_bounds(&self) -> Rect;

    /// Bounds of the item at `index`, or `None` if it is not laid out.
    fn item_bounds(&self, index: usize) -> Option<Rect>;
}

/// Region highlighted while hovering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DropHighlight {
    #[default]
    None,
    /// The fields would be appended to the list.
    List(Rect),
    /// The fields would become children of the item at `index`.
    Parent { index: usize, bounds: Rect },
}

/// Where dropped fields were added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    List,
    Parent(usize),
}

/// Result of handling one drag event.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// A hover event; the region to highlight.
    Hover(DropHighlight),
    /// A drop that added fields.
    ///
    /// `added` holds the items actually created; fields no type accepts are
    /// skipped.
    Dropped { target: DropTarget, added: Vec<ItemId> },
    /// A drop outside the list or without a compatible field.
    Ignored,
}

/// Routes drag events into a [`SourceListEngine`].
pub struct DragRouter {
    highlight: DropHighlight,
    /// Emitted when the highlighted region changes.
    pub highlight_changed: Signal<DropHighlight>,
}

impl Default for DragRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl DragRouter {
    /// Creates a router with nothing highlighted.
    pub fn new() -> Self {
        Self {
            highlight: DropHighlight::None,
            highlight_changed: Signal::new(),
        }
    }

    /// Returns the current highlight.
    pub fn highlight(&self) -> DropHighlight {
        self.highlight
    }

    /// Handles one drag event.
    pub fn handle(
        &mut self,
        engine: &mut SourceListEngine,
        event: &DragEvent,
        layout: &dyn ListLayout,
        source: &dyn LogDataSource,
    ) -> DragOutcome {
        let list_bounds = layout.list_bounds();
        if list_bounds.is_empty() {
            self.set_highlight(DropHighlight::None);
            return match event.phase {
                DragPhase::Hover => DragOutcome::Hover(DropHighlight::None),
                DragPhase::Drop => DragOutcome::Ignored,
            };
        }

        let within_list = list_bounds.contains_strict(event.pointer);
        let catalog = engine.catalog();
        let list_valid = any_field_matches(
            event,
            source,
            |kind| catalog.independent_source_kinds().contains(kind),
        );

        // Rows can overlap while animating; the last one wins.
        let hovered_parent = (0..engine.len())
            .filter(|&index| engine.role(index).is_parent())
            .filter_map(|index| layout.item_bounds(index).map(|bounds| (index, bounds)))
            .filter(|(_, bounds)| bounds.contains_strict(event.pointer))
            .last();

        let valid_parent = hovered_parent.filter(|&(index, _)| {
            let Some(parent_key) = catalog.parent_key(&engine.item(index).type_key) else {
                return false;
            };
            let child_kinds: BTreeSet<&str> = catalog.child_source_kinds(parent_key);
            any_field_matches(event, source, |kind| child_kinds.contains(kind))
        });

        tracing::trace!(
            target: targets::DRAG,
            phase = ?event.phase,
            within_list,
            list_valid,
            parent = valid_parent.map(|(index, _)| index),
            "drag event"
        );

        match event.phase {
            DragPhase::Drop => {
                self.set_highlight(DropHighlight::None);
                let (target, parent_index) = match valid_parent {
                    Some((index, _)) => (DropTarget::Parent(index), Some(index)),
                    None if within_list && list_valid => (DropTarget::List, None),
                    None => return DragOutcome::Ignored,
                };

                let added: Vec<ItemId> = event
                    .field_keys
                    .iter()
                    .filter_map(|field| engine.add_field_from_source(source, field, parent_index))
                    .collect();

                tracing::debug!(target: targets::DRAG, ?target, added = added.len(), "dropped fields");
                DragOutcome::Dropped { target, added }
            }
            DragPhase::Hover => {
                let highlight = match valid_parent {
                    Some((index, bounds)) => DropHighlight::Parent {
                        index,
                        // Full list width at the parent row.
                        bounds: Rect::new(
                            list_bounds.left(),
                            bounds.top(),
                            list_bounds.width(),
                            bounds.height(),
                        ),
                    },
                    None if within_list && list_valid => DropHighlight::List(list_bounds),
                    None => DropHighlight::None,
                };
                self.set_highlight(highlight);
                DragOutcome::Hover(highlight)
            }
        }
    }

    fn set_highlight(&mut self, highlight: DropHighlight) {
        if self.highlight != highlight {
            self.highlight = highlight;
            self.highlight_changed.emit(highlight);
        }
    }
}

/// Returns true if the source or structured kind of any dragged field
/// satisfies `accepts`.
fn any_field_matches(
    event: &DragEvent,
    source: &dyn LogDataSource,
    accepts: impl Fn(&str) -> bool,
) -> bool {
    event.field_keys.iter().any(|field| {
        source.source_kind(field).is_some_and(|kind| accepts(&kind))
            || source.structured_kind(field).is_some_and(|kind| accepts(&kind))
    })
}
