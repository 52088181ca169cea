//! Asynchronous type-change prompts.
//!
//! Asking the user for a new type is the one operation that does not
//! complete synchronously. The engine registers a pending prompt, hands its
//! [`PromptId`] to a [`PromptService`] and returns. The answer arrives later
//! through [`SourceListEngine::resolve_prompt`](crate::model::SourceListEngine::resolve_prompt),
//! possibly out of order, possibly never.

use horizon_sourcelist_core::Point;
use slotmap::{SlotMap, new_key_type};

use crate::catalog::TypeCatalog;
use crate::model::{ItemId, ListItem};

new_key_type! {
    /// Correlates a prompt request with its answer.
    pub struct PromptId;
}

/// Presents type choices to the user.
pub trait PromptService {
    /// Shows the prompt for `item` at screen `coordinates`.
    ///
    /// Must not call back into the engine synchronously.
    fn request(&self, id: PromptId, catalog: &TypeCatalog, item: &ListItem, coordinates: Point);
}

/// Outcome of answering a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResolution {
    /// The change was applied to the item now at `index`.
    Applied { index: usize },
    /// The prompt was unknown or its item no longer exists.
    Discarded,
}

impl PromptResolution {
    pub fn is_applied(&self) -> bool {
        matches!(self, PromptResolution::Applied { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingPrompt {
    item: ItemId,
}

/// Pending prompts of one engine.
#[derive(Debug, Default)]
pub(crate) struct PromptRegistry {
    pending: SlotMap<PromptId, PendingPrompt>,
}

impl PromptRegistry {
    pub(crate) fn register(&mut self, item: ItemId) -> PromptId {
        self.pending.insert(PendingPrompt { item })
    }

    /// Removes a prompt, returning the item it targets.
    pub(crate) fn take(&mut self, id: PromptId) -> Option<ItemId> {
        self.pending.remove(id).map(|prompt| prompt.item)
    }

    /// Drops every prompt targeting one of `items`.
    pub(crate) fn forget_items(&mut self, items: &[ItemId]) {
        self.pending.retain(|_, prompt| !items.contains(&prompt.item));
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_take_and_forget() {
        let mut items: SlotMap<ItemId, ()> = SlotMap::with_key();
        let first = items.insert(());
        let second = items.insert(());

        let mut registry = PromptRegistry::default();
        let a = registry.register(first);
        let b = registry.register(second);
        let c = registry.register(first);
        assert_eq!(registry.len(), 3);

        assert_eq!(registry.take(b), Some(second));
        assert_eq!(registry.take(b), None);

        registry.forget_items(&[first]);
        assert_eq!(registry.take(a), None);
        assert_eq!(registry.take(c), None);
        assert_eq!(registry.len(), 0);
    }
}
