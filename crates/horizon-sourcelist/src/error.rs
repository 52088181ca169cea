//! Error types for the source-list engine.

use std::path::PathBuf;

/// Result type alias for source-list operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring, editing or persisting a source list.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An item refers to a type key the catalog does not declare.
    ///
    /// This means the list is corrupted relative to its catalog.
    #[error("Unknown type \"{type_key}\"")]
    UnknownType { type_key: String },

    /// An option key is not declared by the item's type.
    #[error("Type \"{type_key}\" has no option \"{option}\"")]
    UnknownOption { type_key: String, option: String },

    /// An option value is not in the value set declared for the option.
    #[error("Invalid value \"{value}\" for option \"{option}\" of type \"{type_key}\"")]
    InvalidOption {
        type_key: String,
        option: String,
        value: String,
    },

    /// The type does not accept the item's source kind.
    #[error("Type \"{type_key}\" does not accept source kind \"{source_kind}\"")]
    IncompatibleType {
        type_key: String,
        source_kind: String,
    },

    /// A retype would move an item in or out of a parent's child group.
    #[error("Cannot change type \"{from}\" to \"{to}\": child grouping differs")]
    InvalidRetype { from: String, to: String },

    /// The type catalog is malformed.
    #[error("Invalid type catalog: {0}")]
    InvalidCatalog(String),

    /// File I/O error.
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create an unknown type error.
    pub fn unknown_type(type_key: impl Into<String>) -> Self {
        Self::UnknownType {
            type_key: type_key.into(),
        }
    }

    /// Create a catalog validation error.
    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        Self::InvalidCatalog(message.into())
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
