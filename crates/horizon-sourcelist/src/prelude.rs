//! Prelude module for Horizon Sourcelist.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use horizon_sourcelist::prelude::*;
//! ```

// ============================================================================
// Core
// ============================================================================

pub use crate::{ConnectionId, Point, Rect, Signal, Size};

// ============================================================================
// Catalog and Configuration
// ============================================================================

pub use crate::catalog::{OptionDefinition, OptionValue, SourceListConfig, TypeCatalog, TypeDefinition};

// ============================================================================
// Model
// ============================================================================

pub use crate::model::{ItemId, ListItem, SourceListEngine, StructuralRole};
pub use crate::presentation::{ItemPresentation, Theme};

// ============================================================================
// Collaborators
// ============================================================================

pub use crate::drag::{DragEvent, DragOutcome, DragPhase, DragRouter, DropHighlight, ListLayout};
pub use crate::memory::{JsonPreferenceStore, PreferenceEntry, PreferenceMemory, PreferenceStore};
pub use crate::prompt::{PromptId, PromptResolution, PromptService};
pub use crate::source::{LogDataSource, RenderingSurface};

// ============================================================================
// Errors
// ============================================================================

pub use crate::error::Error;
