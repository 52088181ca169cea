//! Horizon Sourcelist - type-resolved field lists for telemetry viewers.
//!
//! A source list holds the fields a user put into a view. Each field is
//! resolved to a presentation type from a declarative [`TypeCatalog`]
//! (a robot, a ghost, a graph line...), may be grouped under a parent item
//! and remembers its type across sessions through [`PreferenceMemory`].
//!
//! This crate re-exports the core crate, so signals and geometry types are
//! available from here as well.
//!
//! # Example
//!
//! ```
//! use horizon_sourcelist::prelude::*;
//!
//! let config = SourceListConfig::from_json_str(r#"{
//!     "title": "Odometry",
//!     "autoAdvance": true,
//!     "typeMemoryId": "odometry",
//!     "types": [
//!         {"key": "robot", "display": "Robot", "sourceTypes": ["Pose2d"], "parentKey": "robot"},
//!         {"key": "ghost", "display": "Ghost", "sourceTypes": ["Pose2d"], "childOf": "robot"}
//!     ]
//! }"#)?;
//!
//! let memory = PreferenceMemory::shared();
//! let mut engine = SourceListEngine::from_config(&config)?.with_memory(memory.clone());
//!
//! engine.add_field("/Odometry/Robot", "Pose2d", None, None);
//! engine.add_field("/Odometry/Setpoint", "Pose2d", None, Some(0));
//! assert_eq!(engine.role(1), StructuralRole::Child);
//! assert_eq!(memory.get("odometry", "/Odometry/Setpoint").unwrap().type_key, "ghost");
//! # Ok::<(), horizon_sourcelist::Error>(())
//! ```

pub use horizon_sourcelist_core::*;

pub mod catalog;
pub mod drag;
pub mod error;
pub mod memory;
pub mod model;
pub mod prelude;
pub mod presentation;
pub mod prompt;
pub mod source;

pub use catalog::{SourceListConfig, TypeCatalog, TypeDefinition};
pub use error::{Error, Result};
pub use memory::PreferenceMemory;
pub use model::SourceListEngine;
