//! The source list engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use horizon_sourcelist_core::logging::targets;
use horizon_sourcelist_core::{PerfSpan, Point, ThreadAffinity, TreeFormatOptions, TreeRow, format_tree};
use slotmap::SlotMap;

use super::item::{ItemId, ListItem, StructuralRole};
use super::signals::ListSignals;
use crate::catalog::{SourceListConfig, TypeCatalog, TypeDefinition};
use crate::error::{Error, Result};
use crate::memory::{PreferenceEntry, PreferenceMemory};
use crate::presentation::{DeprecationWarning, ItemPresentation, Theme, is_deprecated};
use crate::prompt::{PromptId, PromptRegistry, PromptResolution, PromptService};
use crate::source::{LogDataSource, NullSurface, RenderingSurface};

/// An ordered list of fields, each resolved to a type of a [`TypeCatalog`].
///
/// Items whose type declares `childOf` always sit in the contiguous block
/// directly after a parent declaring the matching `parentKey`. Every
/// operation keeps that arrangement intact: removing or retyping a parent
/// takes its block with it, and restoring a saved state drops orphans.
///
/// The engine is single-threaded. All mutation goes through `&mut self` on
/// the thread that created it.
///
/// # Example
///
/// ```
/// use horizon_sourcelist::catalog::{TypeCatalog, TypeDefinition};
/// use horizon_sourcelist::model::{SourceListEngine, StructuralRole};
///
/// let catalog = TypeCatalog::new(
///     vec![
///         TypeDefinition::new("robot", "Robot", ["Pose2d"]).with_parent_key("robot"),
///         TypeDefinition::new("ghost", "Ghost", ["Pose2d"]).with_child_of("robot"),
///     ],
///     false,
/// )
/// .unwrap();
/// let mut engine = SourceListEngine::new(catalog);
///
/// engine.add_field("/Odometry", "Pose2d", None, None).unwrap();
/// engine.add_field("/Setpoint", "Pose2d", None, Some(0)).unwrap();
/// assert_eq!(engine.item(1).type_key, "ghost");
/// assert_eq!(engine.role(1), StructuralRole::Child);
///
/// // Removing the parent removes its children.
/// engine.remove_item(0);
/// assert!(engine.is_empty());
/// ```
pub struct SourceListEngine {
    catalog: TypeCatalog,
    title: String,
    items: SlotMap<ItemId, ListItem>,
    order: Vec<ItemId>,
    prompts: PromptRegistry,
    signals: ListSignals,
    memory: Option<Arc<PreferenceMemory>>,
    memory_namespace: Option<String>,
    surface: Box<dyn RenderingSurface>,
    theme: Theme,
    last_tick_theme: Option<Theme>,
    stopped: bool,
    affinity: ThreadAffinity,
}

impl SourceListEngine {
    /// Creates an empty engine drawing to no surface.
    pub fn new(catalog: TypeCatalog) -> Self {
        Self {
            catalog,
            title: String::new(),
            items: SlotMap::with_key(),
            order: Vec::new(),
            prompts: PromptRegistry::default(),
            signals: ListSignals::new(),
            memory: None,
            memory_namespace: None,
            surface: Box::new(NullSurface),
            theme: Theme::default(),
            last_tick_theme: None,
            stopped: false,
            affinity: ThreadAffinity::current(),
        }
    }

    /// Creates an engine from a configuration.
    ///
    /// The title and the type memory namespace come from the configuration.
    pub fn from_config(config: &SourceListConfig) -> Result<Self> {
        let mut engine = Self::new(config.to_catalog()?);
        engine.title = config.title.clone();
        engine.memory_namespace = config.type_memory_id.clone();
        Ok(engine)
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Attaches shared type memory.
    ///
    /// Memory is only consulted once a namespace is set as well.
    pub fn with_memory(mut self, memory: Arc<PreferenceMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Sets the type memory namespace.
    pub fn with_memory_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.memory_namespace = Some(namespace.into());
        self
    }

    /// Sets the surface items are drawn to.
    pub fn with_surface(mut self, surface: Box<dyn RenderingSurface>) -> Self {
        self.surface = surface;
        self
    }

    /// Sets the theme presentation is derived for until the next tick.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn signals(&self) -> &ListSignals {
        &self.signals
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true when the list holds no items.
    ///
    /// Surfaces show their empty-list hint in this state.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn item(&self, index: usize) -> &ListItem {
        &self.items[self.id_at(index)]
    }

    pub fn get(&self, index: usize) -> Option<&ListItem> {
        self.order.get(index).map(|&id| &self.items[id])
    }

    /// Returns the identity of the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn id_at(&self, index: usize) -> ItemId {
        self.check_index(index);
        self.order[index]
    }

    /// Returns the current position of an item.
    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Iterates over the items in list order.
    pub fn items(&self) -> impl Iterator<Item = &ListItem> + '_ {
        self.order.iter().map(|&id| &self.items[id])
    }

    /// Returns a copy of the list for persistence.
    pub fn get_state(&self) -> Vec<ListItem> {
        self.items().cloned().collect()
    }

    /// Returns the field key of every item, in list order.
    pub fn active_field_keys(&self) -> Vec<String> {
        self.items().map(|item| item.log_key.clone()).collect()
    }

    /// Returns the structural role of the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn role(&self, index: usize) -> StructuralRole {
        let item = self.item(index);
        match self.catalog.get(&item.type_key) {
            Some(definition) if definition.is_child() => StructuralRole::Child,
            Some(definition) if definition.is_parent() => StructuralRole::Parent,
            _ => StructuralRole::Standalone,
        }
    }

    /// Returns the number of prompts still awaiting an answer.
    pub fn pending_prompts(&self) -> usize {
        self.prompts.len()
    }

    /// Returns true once [`stop`](Self::stop) was called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Derives the presentation of the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if the item's type is not in the catalog.
    pub fn presentation(&self, index: usize) -> Result<ItemPresentation> {
        let is_child = self.role(index).is_child();
        ItemPresentation::for_item(&self.catalog, self.item(index), is_child, self.theme)
    }

    /// Renders the list as an indented tree for debugging.
    pub fn debug_tree(&self) -> String {
        let rows: Vec<TreeRow> = (0..self.len())
            .map(|index| {
                let item = self.item(index);
                let depth = usize::from(self.role(index).is_child());
                let hidden = if item.visible { "" } else { " (hidden)" };
                TreeRow::new(depth, format!("{}: {}{}", item.type_key, item.log_key, hidden))
            })
            .collect();
        let title = if self.title.is_empty() { "Source List" } else { self.title.as_str() };
        format_tree(title, &rows, &TreeFormatOptions::default())
    }

    // =========================================================================
    // Adding fields
    // =========================================================================

    /// Adds a field, resolving it to the best compatible type.
    ///
    /// With `parent_index`, the field is offered to the child types of that
    /// item's parent key and inserted after its child block. Without it,
    /// only types that are not children qualify and the item is appended.
    ///
    /// Returns `None` when no type accepts the field.
    ///
    /// # Panics
    ///
    /// Panics if `parent_index` is out of bounds.
    pub fn add_field(
        &mut self,
        field_key: &str,
        source_kind: &str,
        structured_kind: Option<&str>,
        parent_index: Option<usize>,
    ) -> Option<ItemId> {
        self.affinity.debug_assert_same_thread();

        let parent_context = parent_index.and_then(|index| self.parent_context(index));
        let kind = match structured_kind {
            Some(structured)
                if self.catalog.accepts_in_context(structured, parent_context.as_deref()) =>
            {
                structured
            }
            _ => source_kind,
        };

        let remembered = self.remembered(field_key);
        let Some(definition) = self.rank_candidates(kind, parent_context.as_deref(), remembered.as_ref())
        else {
            tracing::debug!(
                target: targets::ENGINE,
                field_key,
                kind,
                parent_context = parent_context.as_deref(),
                "no compatible type, field dropped"
            );
            return None;
        };

        let options = self.initial_options(definition, remembered.as_ref());
        // Children start out with their parent's visibility.
        let visible = match parent_index {
            Some(index) if definition.is_child() => self.item(index).visible,
            _ => true,
        };
        let item = ListItem {
            type_key: definition.key.clone(),
            log_key: field_key.to_string(),
            log_type: kind.to_string(),
            visible,
            options,
        };

        let position = match parent_index {
            Some(index) => self.block_end(index),
            None => self.len(),
        };

        tracing::debug!(
            target: targets::ENGINE,
            field_key,
            type_key = %item.type_key,
            position,
            "adding field"
        );

        let id = self.insert_item(position, item);
        self.remember(position);
        Some(id)
    }

    /// Adds a field, asking `source` for its kinds.
    ///
    /// Fields the source does not know are not added.
    pub fn add_field_from_source(
        &mut self,
        source: &dyn LogDataSource,
        field_key: &str,
        parent_index: Option<usize>,
    ) -> Option<ItemId> {
        let structured_kind = source.structured_kind(field_key);
        let source_kind = source
            .source_kind(field_key)
            .or_else(|| structured_kind.clone())?;
        self.add_field(field_key, &source_kind, structured_kind.as_deref(), parent_index)
    }

    /// Returns the parent key that children of the item at `index` use.
    fn parent_context(&self, index: usize) -> Option<String> {
        let item = self.item(index);
        self.catalog
            .get(&item.type_key)
            .filter(|definition| !definition.is_child())
            .and_then(|definition| definition.parent_key.clone())
    }

    /// Picks the best type for a source kind.
    fn rank_candidates(
        &self,
        kind: &str,
        parent_context: Option<&str>,
        remembered: Option<&PreferenceEntry>,
    ) -> Option<&TypeDefinition> {
        let mut candidates = self.catalog.resolve_candidates(kind, parent_context);
        if candidates.is_empty() {
            return None;
        }

        if self.catalog.auto_advance() {
            // Stable, so equally used types keep declaration order.
            candidates.sort_by_key(|definition| self.type_usage(&definition.key));
        }

        if let Some(entry) = remembered
            && let Some(position) = candidates.iter().position(|d| d.key == entry.type_key)
        {
            let preferred = candidates.remove(position);
            candidates.insert(0, preferred);
        }

        candidates.first().copied()
    }

    fn initial_options(
        &self,
        definition: &TypeDefinition,
        remembered: Option<&PreferenceEntry>,
    ) -> BTreeMap<String, String> {
        // Remembered values apply to any type that declares the same option.
        definition
            .options
            .iter()
            .map(|option| {
                let from_memory = remembered
                    .and_then(|entry| entry.options.get(&option.key))
                    .filter(|value| option.has_value(value));

                let value = match from_memory {
                    Some(value) => value.clone(),
                    None if definition.auto_advance_option_key.as_deref() == Some(option.key.as_str()) => {
                        // min_by_key keeps the first of equally used values.
                        option
                            .values
                            .iter()
                            .min_by_key(|value| {
                                self.option_usage(&definition.key, &option.key, &value.key)
                            })
                            .map(|value| value.key.clone())
                            .unwrap_or_default()
                    }
                    None => option.default_value().to_string(),
                };
                (option.key.clone(), value)
            })
            .collect()
    }

    fn type_usage(&self, type_key: &str) -> usize {
        self.items().filter(|item| item.type_key == type_key).count()
    }

    fn option_usage(&self, type_key: &str, option_key: &str, value_key: &str) -> usize {
        self.items()
            .filter(|item| item.type_key == type_key)
            .filter(|item| item.options.get(option_key).map(String::as_str) == Some(value_key))
            .count()
    }

    // =========================================================================
    // Structural edits
    // =========================================================================

    /// Removes the item at `index`, along with its child block when it is a
    /// parent. Returns the number of removed items.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_item(&mut self, index: usize) -> usize {
        self.affinity.debug_assert_same_thread();

        let end = if self.role(index).is_child() {
            index + 1
        } else {
            self.block_end(index)
        };
        self.remove_range(index, end);
        end - index
    }

    /// Flips the visibility of the item at `index` and its child block.
    ///
    /// Children follow their parent and cannot be toggled on their own, so
    /// this returns `false` and changes nothing for a child.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn toggle_visibility(&mut self, index: usize) -> bool {
        self.affinity.debug_assert_same_thread();

        if self.role(index).is_child() {
            return false;
        }

        let visible = !self.item(index).visible;
        for position in index..self.block_end(index) {
            let id = self.order[position];
            self.items[id].visible = visible;
            self.signals.item_changed.emit(position);
            self.notify_item(position);
        }
        true
    }

    /// Changes the type and options of the item at `index`.
    ///
    /// Options missing from `options` get their first declared value. When
    /// the item is not a child and the change alters its parent key, the
    /// child block after it is removed.
    ///
    /// # Errors
    ///
    /// Fails without changing anything when the type is unknown, does not
    /// accept the item's source kind, would move the item in or out of a
    /// child group, or when `options` holds an undeclared option or value.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn change_item_type(
        &mut self,
        index: usize,
        type_key: &str,
        options: BTreeMap<String, String>,
    ) -> Result<()> {
        self.affinity.debug_assert_same_thread();

        let current = self.item(index);
        let previous = self.catalog.require(&current.type_key)?;
        let definition = self.catalog.require(type_key)?;

        if !definition.accepts(&current.log_type) {
            return Err(Error::IncompatibleType {
                type_key: type_key.to_string(),
                source_kind: current.log_type.clone(),
            });
        }
        if previous.child_of != definition.child_of {
            return Err(Error::InvalidRetype {
                from: previous.key.clone(),
                to: definition.key.clone(),
            });
        }
        let options = complete_options(definition, options)?;
        let cascade = !previous.is_child() && previous.parent_key != definition.parent_key;

        tracing::debug!(
            target: targets::ENGINE,
            index,
            from = %previous.key,
            to = type_key,
            cascade,
            "changing item type"
        );

        let id = self.order[index];
        let item = &mut self.items[id];
        item.type_key = type_key.to_string();
        item.options = options;

        if cascade {
            let end = self.block_end(index);
            self.remove_range(index + 1, end);
        }

        self.signals.item_changed.emit(index);
        self.notify_item(index);
        self.remember(index);
        Ok(())
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        self.affinity.debug_assert_same_thread();

        self.items.clear();
        self.order.clear();
        self.prompts.clear();
        self.signals.state_reset.emit(());
    }

    /// Replaces the list with a saved state.
    ///
    /// Roles are derived again rather than trusted: children without a
    /// matching parent in front of them are dropped, children take their
    /// parent's visibility, and undeclared or missing option values are
    /// replaced with the first declared value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] and leaves the list untouched if any
    /// item names a type the catalog does not declare.
    pub fn set_state(&mut self, state: Vec<ListItem>) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let _span = PerfSpan::new("source_list.set_state");

        for item in &state {
            self.catalog.require(&item.type_key)?;
        }

        let mut restored: Vec<ListItem> = Vec::with_capacity(state.len());
        // Parent key and visibility of the last item that is not a child.
        let mut block: Option<(Option<&str>, bool)> = None;

        for mut item in state {
            let definition = self.catalog.require(&item.type_key)?;
            match (&definition.child_of, block) {
                (Some(child_of), Some((Some(parent_key), visible))) if child_of == parent_key => {
                    item.visible = visible;
                }
                (Some(child_of), _) => {
                    tracing::warn!(
                        target: targets::ENGINE,
                        log_key = %item.log_key,
                        type_key = %item.type_key,
                        child_of = %child_of,
                        "dropping child without a parent"
                    );
                    continue;
                }
                (None, _) => {
                    block = Some((definition.parent_key.as_deref(), item.visible));
                }
            }

            item.options = repair_options(definition, std::mem::take(&mut item.options));
            restored.push(item);
        }

        self.items.clear();
        self.order.clear();
        self.prompts.clear();
        for item in restored {
            let id = self.items.insert(item);
            self.order.push(id);
        }

        tracing::debug!(target: targets::ENGINE, items = self.len(), "restored state");
        self.signals.state_reset.emit(());

        for index in 0..self.len() {
            self.notify_item(index);
            self.remember(index);
            self.warn_if_deprecated(index, false);
        }
        Ok(())
    }

    /// Stops periodic refreshes. Later ticks do nothing.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Refreshes presentation.
    ///
    /// Every item is redrawn when `theme` differs from the previous tick's
    /// theme (and on the first tick); previews are refreshed every time.
    /// Authoritative state is never touched.
    pub fn tick(&mut self, theme: Theme) -> Result<()> {
        if self.stopped {
            return Ok(());
        }

        if self.last_tick_theme != Some(theme) {
            self.last_tick_theme = Some(theme);
            self.theme = theme;
            for index in 0..self.len() {
                let presentation = self.presentation(index)?;
                self.surface.update_item(index, &presentation);
            }
        }

        for (index, item) in self.items().enumerate() {
            self.surface.update_preview(index, item);
        }
        Ok(())
    }

    /// Refreshes presentation for the system color scheme.
    ///
    /// See [`Theme::detect`] and [`tick`](Self::tick).
    pub fn tick_system_theme(&mut self) -> Result<()> {
        self.tick(Theme::detect())
    }

    /// Emits the deprecation warning for the item at `index` on request.
    ///
    /// Returns false if the item does not use a deprecated source kind.
    pub fn show_deprecation_warning(&self, index: usize) -> bool {
        self.warn_if_deprecated(index, true)
    }

    // =========================================================================
    // Type prompts
    // =========================================================================

    /// Asks `service` for a new type for the item at `index`.
    ///
    /// Returns immediately. The answer is applied by
    /// [`resolve_prompt`](Self::resolve_prompt) to wherever the item is at
    /// that time.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn request_type_change(
        &mut self,
        index: usize,
        coordinates: Point,
        service: &dyn PromptService,
    ) -> PromptId {
        self.affinity.debug_assert_same_thread();

        let item_id = self.id_at(index);
        let prompt = self.prompts.register(item_id);
        tracing::debug!(target: targets::PROMPT, ?prompt, index, "requesting type prompt");
        service.request(prompt, &self.catalog, &self.items[item_id], coordinates);
        prompt
    }

    /// Applies the answer to a prompt.
    ///
    /// Only the type and options of `new_state` are used. Answers to unknown
    /// or cancelled prompts, or for removed items, are discarded.
    ///
    /// # Errors
    ///
    /// Returns the error of [`change_item_type`](Self::change_item_type)
    /// when the chosen type is not valid for the item. The prompt is
    /// consumed either way.
    pub fn resolve_prompt(&mut self, prompt: PromptId, new_state: ListItem) -> Result<PromptResolution> {
        self.affinity.debug_assert_same_thread();

        let Some(index) = self.prompts.take(prompt).and_then(|id| self.index_of(id)) else {
            tracing::debug!(target: targets::PROMPT, ?prompt, "discarding prompt answer");
            return Ok(PromptResolution::Discarded);
        };

        self.change_item_type(index, &new_state.type_key, new_state.options)?;
        Ok(PromptResolution::Applied { index })
    }

    /// Drops a pending prompt. Returns false if it was not pending.
    pub fn cancel_prompt(&mut self, prompt: PromptId) -> bool {
        self.prompts.take(prompt).is_some()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_index(&self, index: usize) {
        assert!(
            index < self.order.len(),
            "index {index} out of bounds for source list of length {}",
            self.order.len()
        );
    }

    fn is_child_at(&self, index: usize) -> bool {
        self.catalog.is_child_type(&self.items[self.order[index]].type_key)
    }

    /// End (exclusive) of the block starting at `index`: the item itself
    /// plus the children directly following it.
    fn block_end(&self, index: usize) -> usize {
        self.check_index(index);
        let mut end = index + 1;
        while end < self.len() && self.is_child_at(end) {
            end += 1;
        }
        end
    }

    fn insert_item(&mut self, position: usize, item: ListItem) -> ItemId {
        let id = self.items.insert(item);
        self.order.insert(position, id);
        self.signals.rows_inserted.emit((position, position));
        self.notify_item(position);
        self.warn_if_deprecated(position, false);
        id
    }

    fn remove_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let removed: Vec<ItemId> = self.order.drain(start..end).collect();
        for id in &removed {
            self.items.remove(*id);
        }
        self.prompts.forget_items(&removed);
        tracing::debug!(target: targets::ENGINE, start, count = removed.len(), "removed items");
        self.signals.emit_rows_removed(start, removed.len());
    }

    fn notify_item(&self, index: usize) {
        match self.presentation(index) {
            Ok(presentation) => self.surface.update_item(index, &presentation),
            Err(error) => {
                tracing::error!(target: targets::ENGINE, index, %error, "cannot present item");
            }
        }
    }

    fn warn_if_deprecated(&self, index: usize, forced: bool) -> bool {
        let item = self.item(index);
        let deprecated = self
            .catalog
            .get(&item.type_key)
            .is_some_and(|definition| is_deprecated(definition, item));
        if deprecated {
            self.signals.deprecation_warning.emit(DeprecationWarning {
                log_key: item.log_key.clone(),
                type_key: item.type_key.clone(),
                source_kind: item.log_type.clone(),
                forced,
            });
        }
        deprecated
    }

    fn remembered(&self, field_key: &str) -> Option<PreferenceEntry> {
        let memory = self.memory.as_ref()?;
        let namespace = self.memory_namespace.as_deref()?;
        memory.get(namespace, field_key)
    }

    fn remember(&self, index: usize) {
        if let (Some(memory), Some(namespace)) = (&self.memory, &self.memory_namespace) {
            let item = self.item(index);
            memory.set(
                namespace,
                &item.log_key,
                PreferenceEntry::new(item.type_key.clone(), item.options.clone()),
            );
        }
    }
}

/// Validates requested options and fills in the missing ones.
fn complete_options(
    definition: &TypeDefinition,
    mut options: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    for (key, value) in &options {
        let option = definition.option(key).ok_or_else(|| Error::UnknownOption {
            type_key: definition.key.clone(),
            option: key.clone(),
        })?;
        if !option.has_value(value) {
            return Err(Error::InvalidOption {
                type_key: definition.key.clone(),
                option: key.clone(),
                value: value.clone(),
            });
        }
    }
    for option in &definition.options {
        options
            .entry(option.key.clone())
            .or_insert_with(|| option.default_value().to_string());
    }
    Ok(options)
}

/// Keeps valid declared values and replaces everything else with defaults.
fn repair_options(
    definition: &TypeDefinition,
    mut options: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    definition
        .options
        .iter()
        .map(|option| {
            let value = match options.remove(&option.key) {
                Some(value) if option.has_value(&value) => value,
                _ => option.default_value().to_string(),
            };
            (option.key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::catalog::OptionDefinition;

    fn catalog() -> TypeCatalog {
        TypeCatalog::new(
            vec![
                TypeDefinition::new("robot", "Robot", ["Pose2d", "NumberArray"])
                    .with_parent_key("robot")
                    .with_option(OptionDefinition::new("model", ["KitBot", "Crab"]))
                    .with_deprecated_source_kind("NumberArray"),
                TypeDefinition::new("ghost", "Ghost", ["Pose2d"])
                    .with_child_of("robot")
                    .with_option(OptionDefinition::new("color", ["#00ff00", "#ffff00"]))
                    .with_auto_advance_option("color"),
                TypeDefinition::new("heatmap", "Heatmap", ["Pose2d", "Translation2d"]),
                TypeDefinition::new("axes", "Axes", ["Pose2d"]).with_parent_key("axes"),
            ],
            false,
        )
        .unwrap()
    }

    fn engine() -> SourceListEngine {
        SourceListEngine::new(catalog()).with_title("Poses")
    }

    fn types(engine: &SourceListEngine) -> Vec<&str> {
        engine.items().map(|item| item.type_key.as_str()).collect()
    }

    #[test]
    fn test_add_and_roles() {
        let mut engine = engine();
        engine.add_field("/Robot", "Pose2d", None, None).unwrap();
        engine.add_field("/Ghost", "Pose2d", None, Some(0)).unwrap();
        engine.add_field("/Heat", "Translation2d", None, None).unwrap();

        assert_eq!(types(&engine), vec!["robot", "ghost", "heatmap"]);
        assert_eq!(engine.role(0), StructuralRole::Parent);
        assert_eq!(engine.role(1), StructuralRole::Child);
        assert_eq!(engine.role(2), StructuralRole::Standalone);
        assert_eq!(engine.active_field_keys(), vec!["/Robot", "/Ghost", "/Heat"]);
    }

    #[test]
    fn test_incompatible_field_is_dropped() {
        let mut engine = engine();
        assert!(engine.add_field("/Flag", "Boolean", None, None).is_none());
        assert!(engine.is_empty());

        engine.add_field("/Heat", "Translation2d", None, None).unwrap();
        // Heatmaps are not parents, so no child type applies.
        assert!(engine.add_field("/Ghost", "Pose2d", None, Some(0)).is_some());
        assert_eq!(types(&engine), vec!["heatmap", "robot"]);
    }

    #[test]
    fn test_structured_kind_preferred_when_accepted() {
        let mut engine = engine();
        engine
            .add_field("/Heat", "Struct", Some("Translation2d"), None)
            .unwrap();
        assert_eq!(engine.item(0).log_type, "Translation2d");

        engine.add_field("/Pose", "Pose2d", Some("Unknown"), None).unwrap();
        assert_eq!(engine.item(1).log_type, "Pose2d");
    }

    #[test]
    fn test_children_insert_after_block() {
        let mut engine = engine();
        engine.add_field("/Robot", "Pose2d", None, None).unwrap();
        engine.add_field("/Other", "Pose2d", None, None).unwrap();
        engine.add_field("/G1", "Pose2d", None, Some(0)).unwrap();
        engine.add_field("/G2", "Pose2d", None, Some(0)).unwrap();

        assert_eq!(engine.active_field_keys(), vec!["/Robot", "/G1", "/G2", "/Other"]);
        // Auto-advance option balances values between the ghosts.
        assert_eq!(engine.item(1).options["color"], "#00ff00");
        assert_eq!(engine.item(2).options["color"], "#ffff00");
    }

    #[test]
    fn test_remove_cascades_from_parent_only() {
        let mut engine = engine();
        engine.add_field("/Robot", "Pose2d", None, None).unwrap();
        engine.add_field("/G1", "Pose2d", None, Some(0)).unwrap();
        engine.add_field("/G2", "Pose2d", None, Some(0)).unwrap();
        engine.add_field("/Heat", "Translation2d", None, None).unwrap();

        assert_eq!(engine.remove_item(1), 1);
        assert_eq!(engine.active_field_keys(), vec!["/Robot", "/G2", "/Heat"]);
        assert_eq!(engine.remove_item(0), 2);
        assert_eq!(engine.active_field_keys(), vec!["/Heat"]);
    }

    #[test]
    fn test_toggle_visibility() {
        let mut engine = engine();
        engine.add_field("/Robot", "Pose2d", None, None).unwrap();
        engine.add_field("/G1", "Pose2d", None, Some(0)).unwrap();

        assert!(!engine.toggle_visibility(1));
        assert!(engine.item(1).visible);

        assert!(engine.toggle_visibility(0));
        assert!(!engine.item(0).visible);
        assert!(!engine.item(1).visible);

        engine.add_field("/G2", "Pose2d", None, Some(0)).unwrap();
        assert!(!engine.item(2).visible);
    }

    #[test]
    fn test_change_item_type_validation() {
        let mut engine = engine();
        engine.add_field("/Robot", "Pose2d", None, None).unwrap();
        engine.add_field("/G1", "Pose2d", None, Some(0)).unwrap();

        assert!(matches!(
            engine.change_item_type(0, "swerve", BTreeMap::new()),
            Err(Error::UnknownType { .. })
        ));
        assert!(matches!(
            engine.change_item_type(1, "heatmap", BTreeMap::new()),
            Err(Error::InvalidRetype { .. })
        ));
        assert!(matches!(
            engine.change_item_type(0, "ghost", BTreeMap::new()),
            Err(Error::InvalidRetype { .. })
        ));
        let bad_value = BTreeMap::from([("model".to_string(), "Tank".to_string())]);
        assert!(matches!(
            engine.change_item_type(0, "robot", bad_value),
            Err(Error::InvalidOption { .. })
        ));
        let bad_key = BTreeMap::from([("wheels".to_string(), "4".to_string())]);
        assert!(matches!(
            engine.change_item_type(0, "robot", bad_key),
            Err(Error::UnknownOption { .. })
        ));
        assert_eq!(types(&engine), vec!["robot", "ghost"]);

        engine
            .add_field("/Heat", "Translation2d", None, None)
            .unwrap();
        assert!(matches!(
            engine.change_item_type(2, "robot", BTreeMap::new()),
            Err(Error::IncompatibleType { .. })
        ));
    }

    #[test]
    fn test_retype_with_new_parent_key_drops_children() {
        let mut engine = engine();
        engine.add_field("/Robot", "Pose2d", None, None).unwrap();
        engine.add_field("/G1", "Pose2d", None, Some(0)).unwrap();

        let options = BTreeMap::from([("model".to_string(), "Crab".to_string())]);
        engine.change_item_type(0, "robot", options).unwrap();
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.item(0).options["model"], "Crab");

        engine.change_item_type(0, "axes", BTreeMap::new()).unwrap();
        assert_eq!(types(&engine), vec!["axes"]);
        assert!(engine.item(0).options.is_empty());
    }

    #[test]
    fn test_set_state_repairs() {
        let mut engine = engine();
        let state = vec![
            ListItem::new("ghost", "/Orphan", "Pose2d"),
            ListItem {
                visible: false,
                ..ListItem::new("robot", "/Robot", "Pose2d").with_option("model", "Tank")
            },
            ListItem::new("ghost", "/G1", "Pose2d").with_option("stale", "x"),
            ListItem::new("heatmap", "/Heat", "Pose2d"),
            ListItem::new("ghost", "/Late", "Pose2d"),
        ];
        engine.set_state(state).unwrap();

        assert_eq!(engine.active_field_keys(), vec!["/Robot", "/G1", "/Heat"]);
        assert_eq!(engine.item(0).options["model"], "KitBot");
        assert!(!engine.item(1).visible);
        assert_eq!(
            engine.item(1).options,
            BTreeMap::from([("color".to_string(), "#00ff00".to_string())])
        );
    }

    #[test]
    fn test_set_state_unknown_type_leaves_list() {
        let mut engine = engine();
        engine.add_field("/Robot", "Pose2d", None, None).unwrap();
        let result = engine.set_state(vec![ListItem::new("swerve", "/S", "Pose2d")]);
        assert!(matches!(result, Err(Error::UnknownType { .. })));
        assert_eq!(engine.active_field_keys(), vec!["/Robot"]);
    }

    #[test]
    fn test_prompt_round_trip() {
        struct Recorder(Mutex<Vec<(PromptId, String)>>);
        impl PromptService for Recorder {
            fn request(&self, id: PromptId, _: &TypeCatalog, item: &ListItem, _: Point) {
                self.0.lock().push((id, item.log_key.clone()));
            }
        }

        let mut engine = engine();
        let recorder = Recorder(Mutex::new(Vec::new()));
        engine.add_field("/A", "Pose2d", None, None).unwrap();
        engine.add_field("/B", "Translation2d", None, None).unwrap();

        let first = engine.request_type_change(0, Point::new(10.0, 20.0), &recorder);
        let second = engine.request_type_change(1, Point::ZERO, &recorder);
        assert_eq!(recorder.0.lock().len(), 2);
        assert_eq!(engine.pending_prompts(), 2);

        engine.remove_item(0);
        assert_eq!(engine.pending_prompts(), 1);
        let discarded = engine
            .resolve_prompt(first, ListItem::new("axes", "/A", "Pose2d"))
            .unwrap();
        assert_eq!(discarded, PromptResolution::Discarded);

        assert!(engine.cancel_prompt(second));
        assert!(!engine.cancel_prompt(second));
    }

    #[test]
    fn test_deprecation_warning_signal() {
        let mut engine = engine();
        let warnings = Arc::new(AtomicUsize::new(0));
        let warnings_clone = warnings.clone();
        engine.signals().deprecation_warning.connect(move |warning| {
            assert_eq!(warning.source_kind, "NumberArray");
            warnings_clone.fetch_add(1, Ordering::SeqCst);
        });

        engine.add_field("/Legacy", "NumberArray", None, None).unwrap();
        engine.add_field("/Pose", "Pose2d", None, None).unwrap();
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
        assert!(engine.presentation(0).unwrap().deprecation_warning);

        assert!(engine.show_deprecation_warning(0));
        assert!(!engine.show_deprecation_warning(1));
        assert_eq!(warnings.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_tick_redraws_on_theme_change() {
        #[derive(Default)]
        struct Counts {
            items: AtomicUsize,
            previews: AtomicUsize,
        }
        struct CountingSurface(Arc<Counts>);
        impl RenderingSurface for CountingSurface {
            fn update_item(&self, _: usize, _: &ItemPresentation) {
                self.0.items.fetch_add(1, Ordering::SeqCst);
            }
            fn update_preview(&self, _: usize, _: &ListItem) {
                self.0.previews.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counts = Arc::new(Counts::default());
        let mut engine = engine().with_surface(Box::new(CountingSurface(counts.clone())));
        engine.add_field("/A", "Pose2d", None, None).unwrap();
        engine.add_field("/B", "Pose2d", None, None).unwrap();
        let after_add = counts.items.load(Ordering::SeqCst);

        engine.tick(Theme::Light).unwrap();
        engine.tick(Theme::Light).unwrap();
        assert_eq!(counts.items.load(Ordering::SeqCst), after_add + 2);
        assert_eq!(counts.previews.load(Ordering::SeqCst), 4);

        engine.tick(Theme::Dark).unwrap();
        assert_eq!(counts.items.load(Ordering::SeqCst), after_add + 4);
        assert_eq!(engine.theme(), Theme::Dark);

        engine.stop();
        engine.tick(Theme::Light).unwrap();
        assert_eq!(counts.previews.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_tick_follows_system_theme() {
        let mut engine = engine();
        engine.add_field("/A", "Pose2d", None, None).unwrap();
        engine.tick_system_theme().unwrap();
        assert_eq!(engine.theme(), Theme::detect());

        engine.stop();
        engine.tick_system_theme().unwrap();
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_row_signals() {
        let mut engine = engine();
        let events = Arc::new(Mutex::new(Vec::new()));

        let inserted = events.clone();
        engine.signals().rows_inserted.connect(move |&(first, last)| {
            inserted.lock().push(("inserted", first, last));
        });
        let removed = events.clone();
        engine.signals().rows_removed.connect(move |&(first, last)| {
            removed.lock().push(("removed", first, last));
        });

        engine.add_field("/Robot", "Pose2d", None, None).unwrap();
        engine.add_field("/G1", "Pose2d", None, Some(0)).unwrap();
        engine.add_field("/G2", "Pose2d", None, Some(0)).unwrap();
        engine.remove_item(0);

        assert_eq!(
            *events.lock(),
            vec![
                ("inserted", 0, 0),
                ("inserted", 1, 1),
                ("inserted", 2, 2),
                ("removed", 0, 2),
            ]
        );
    }

    #[test]
    fn test_debug_tree() {
        let mut engine = engine();
        engine.add_field("/Robot", "Pose2d", None, None).unwrap();
        engine.add_field("/G1", "Pose2d", None, Some(0)).unwrap();
        engine.toggle_visibility(0);

        let tree = engine.debug_tree();
        assert!(tree.starts_with("Poses (2 rows):"));
        assert!(tree.contains("[0] robot: /Robot (hidden)"));
        assert!(tree.contains("\u{2514}\u{2500}\u{2500} [1] ghost: /G1 (hidden)"));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_invalid_index_panics() {
        let mut engine = engine();
        engine.remove_item(0);
    }
}
