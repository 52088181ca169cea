//! The ordered item model of a source list.
//!
//! - [`ListItem`]: one bound field and its persisted state
//! - [`StructuralRole`]: standalone, parent or child, derived on demand
//! - [`SourceListEngine`]: owns the items and applies every edit
//! - [`ListSignals`]: change notifications for surfaces

mod item;
mod signals;
mod source_list;

pub use item::{ItemId, ListItem, StructuralRole};
pub use signals::ListSignals;
pub use source_list::SourceListEngine;
