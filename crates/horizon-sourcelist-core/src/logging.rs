//! Logging and debugging facilities for Horizon Sourcelist.
//!
//! This module provides:
//! - Target constants for the `tracing` integration
//! - Debug visualization for flat lists that encode a parent/child hierarchy
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Sourcelist uses the `tracing` crate for instrumentation. To see
//! logs, install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!     // Your application code...
//! }
//! ```
//!
//! # Debug Visualization
//!
//! Use [`format_tree`] to render rows tagged with a depth:
//!
//! ```
//! use horizon_sourcelist_core::logging::{format_tree, TreeFormatOptions, TreeRow};
//!
//! let rows = vec![
//!     TreeRow::new(0, "Swerve: /Drive/Modules"),
//!     TreeRow::new(1, "Ghost: /Drive/Setpoints"),
//! ];
//! let output = format_tree("Source List", &rows, &TreeFormatOptions::default());
//! assert!(output.contains("/Drive/Setpoints"));
//! ```

use std::fmt::Write as FmtWrite;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_sourcelist_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_sourcelist_core::signal";
    /// Source list engine target.
    pub const ENGINE: &str = "horizon_sourcelist::engine";
    /// Type catalog target.
    pub const CATALOG: &str = "horizon_sourcelist::catalog";
    /// Drag routing target.
    pub const DRAG: &str = "horizon_sourcelist::drag";
    /// Type memory target.
    pub const MEMORY: &str = "horizon_sourcelist::memory";
    /// Type prompt target.
    pub const PROMPT: &str = "horizon_sourcelist::prompt";
    /// Performance spans target.
    pub const PERF: &str = "horizon_sourcelist::perf";
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// Whether to prefix each row with its position in the flat list.
    pub show_indices: bool,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            show_indices: true,
            indent_size: 2,
        }
    }
}

/// One row of a flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    /// Nesting depth, 0 for top level rows.
    pub depth: usize,
    /// Text shown for the row.
    pub label: String,
}

impl TreeRow {
    /// Create a row at the given depth.
    pub fn new(depth: usize, label: impl Into<String>) -> Self {
        Self {
            depth,
            label: label.into(),
        }
    }
}

/// Format a flattened tree under a heading.
///
/// A row is the last of its siblings when no later row shares its depth
/// before a shallower row appears.
pub fn format_tree(title: &str, rows: &[TreeRow], options: &TreeFormatOptions) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{} ({} rows):", title, rows.len());

    if rows.is_empty() {
        output.push_str("  (empty)\n");
        return output;
    }

    for (index, row) in rows.iter().enumerate() {
        let is_last = rows[index + 1..]
            .iter()
            .take_while(|next| next.depth >= row.depth)
            .all(|next| next.depth != row.depth);

        output.push_str(&build_prefix(options, row.depth, is_last));
        if options.show_indices {
            let _ = write!(output, "[{index}] ");
        }
        output.push_str(&row.label);
        output.push('\n');
    }

    output
}

/// Build the prefix string for a tree node.
fn build_prefix(options: &TreeFormatOptions, depth: usize, is_last: bool) -> String {
    if depth == 0 {
        return String::new();
    }

    let (branch, corner, last) = ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}");

    let mut prefix = String::new();
    for _ in 0..(depth - 1) {
        prefix.push_str(branch);
        prefix.push_str(&" ".repeat(options.indent_size));
    }
    prefix.push_str(if is_last { last } else { corner });
    prefix.push(' ');
    prefix
}

/// A guard that emits a tracing span when dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
