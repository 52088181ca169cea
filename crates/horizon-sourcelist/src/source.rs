//! Collaborators the engine reads from and draws through.

use crate::model::ListItem;
use crate::presentation::ItemPresentation;

/// Classifies the fields of the loaded data.
pub trait LogDataSource {
    /// Returns the source kind of a field, or `None` for unknown fields.
    fn source_kind(&self, field_key: &str) -> Option<String>;

    /// Returns the structured kind of a field (e.g. a schema name), if any.
    fn structured_kind(&self, field_key: &str) -> Option<String> {
        let _ = field_key;
        None
    }
}

/// Draws list items.
///
/// Calls are fire-and-forget: a surface cannot fail an engine operation.
///
/// `index` is the item's position at the time of the call. Inserts and
/// removals shift later positions without redrawing them, so a surface that
/// keeps per-row state also follows `rows_inserted`, `rows_removed` and
/// `state_reset` on [`ListSignals`](crate::model::ListSignals). Those signals
/// fire before the affected rows are drawn.
pub trait RenderingSurface {
    /// Redraws the item at `index`.
    fn update_item(&self, index: usize, presentation: &ItemPresentation);

    /// Refreshes the value preview of the item at `index`.
    fn update_preview(&self, index: usize, item: &ListItem);
}

/// A surface that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl RenderingSurface for NullSurface {
    fn update_item(&self, _index: usize, _presentation: &ItemPresentation) {}

    fn update_preview(&self, _index: usize, _item: &ListItem) {}
}

impl<F> LogDataSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn source_kind(&self, field_key: &str) -> Option<String> {
        self(field_key)
    }
}
