//! Core systems for Horizon Sourcelist.
//!
//! This crate provides the foundational pieces the source-list engine is
//! built on:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Color**: Hex color parsing and lightness adjustment
//! - **Geometry**: Points and rectangles for pointer hit testing
//! - **Thread Affinity**: Verification that single-threaded state stays on
//!   its owning thread
//! - **Logging**: `tracing` targets, perf spans and tree visualization
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_sourcelist_core::Signal;
//!
//! // Create a signal that notifies when an item changes
//! let item_changed = Signal::<usize>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = item_changed.connect(|index| {
//!     println!("Item {} changed", index);
//! });
//!
//! // Emit the signal
//! item_changed.emit(3);
//!
//! // Disconnect when done
//! item_changed.disconnect(conn_id);
//! ```

pub mod color;
pub mod geometry;
pub mod logging;
pub mod signal;
pub mod thread_check;

pub use color::Color;
pub use geometry::{Point, Rect, Size};
pub use logging::{PerfSpan, TreeFormatOptions, TreeRow, format_tree};
pub use signal::{ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
