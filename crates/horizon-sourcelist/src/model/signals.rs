//! Change notification signals of a source list.

use horizon_sourcelist_core::Signal;

use crate::presentation::DeprecationWarning;

/// Signals emitted by a [`SourceListEngine`](super::SourceListEngine).
///
/// Row ranges are inclusive and refer to positions after the change for
/// insertions and before the change for removals.
pub struct ListSignals {
    /// Emitted after rows have been inserted.
    /// Args: (first row, last row)
    pub rows_inserted: Signal<(usize, usize)>,

    /// Emitted after rows have been removed.
    /// Args: (first row, last row)
    pub rows_removed: Signal<(usize, usize)>,

    /// Emitted when the type, options or visibility of a row changes.
    pub item_changed: Signal<usize>,

    /// Emitted after the whole list has been replaced or cleared.
    pub state_reset: Signal<()>,

    /// Emitted when an item bound to a deprecated source kind appears, or
    /// when the user asks for the warning.
    pub deprecation_warning: Signal<DeprecationWarning>,
}

impl Default for ListSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ListSignals {
    /// Creates a new set of list signals.
    pub fn new() -> Self {
        Self {
            rows_inserted: Signal::new(),
            rows_removed: Signal::new(),
            item_changed: Signal::new(),
            state_reset: Signal::new(),
            deprecation_warning: Signal::new(),
        }
    }

    /// Emits `rows_removed` for a non-empty range of `count` rows.
    pub(crate) fn emit_rows_removed(&self, first: usize, count: usize) {
        if count > 0 {
            self.rows_removed.emit((first, first + count - 1));
        }
    }
}

static_assertions::assert_impl_all!(ListSignals: Send, Sync);
