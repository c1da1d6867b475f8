//! Error types for the migration system.

use std::path::PathBuf;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// A field name did not resolve to a column of the model.
    #[error("Field '{field}' not found on table '{table}'")]
    FieldNotFound {
        /// Table that was searched.
        table: String,
        /// The logical or physical name that was looked up.
        field: String,
    },

    /// A name did not resolve to a foreign-key or check constraint.
    #[error("Constraint '{name}' not found on table '{table}'")]
    ConstraintNotFound {
        /// Table that was searched.
        table: String,
        /// The constraint or field name that was looked up.
        name: String,
    },

    /// A name did not resolve to an index.
    #[error("Index '{name}' not found on table '{table}'")]
    IndexNotFound {
        /// Table that was searched.
        table: String,
        /// The index or field name that was looked up.
        name: String,
    },

    /// The operation is not implemented.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// A statement failed to execute.
    #[error("Failed to execute `{sql}`: {source}")]
    ExecutionFailed {
        /// The statement text.
        sql: String,
        /// Error reported by the store.
        #[source]
        source: sqlx::Error,
    },

    /// A model could not be described.
    #[error("Failed to parse model '{model}': {message}")]
    ParseFailed {
        /// Table or model name.
        model: String,
        /// Error message.
        message: String,
    },

    /// The dialect cannot express the operation.
    #[error("{operation} is not supported by the {dialect} dialect")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// The refused operation.
        operation: &'static str,
    },

    /// IO error (reading manifest files).
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrateError {
    /// Wraps a store error with the statement that caused it.
    pub(crate) fn execution(sql: &str, source: sqlx::Error) -> Self {
        Self::ExecutionFailed {
            sql: sql.to_owned(),
            source,
        }
    }

    /// Builds a [`MigrateError::ParseFailed`].
    pub(crate) fn parse(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseFailed {
            model: model.into(),
            message: message.into(),
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
