use thiserror::Error;

/// Application-wide error types for commerce.txt.
#[derive(Error, Debug)]
pub enum AppError {
    /// The payload could not be recognized as a catalog of the expected kind.
    #[error("Source format unrecognized: {0}")]
    SourceFormatUnrecognized(String),

    /// A single item failed validation while the abort policy was active.
    #[error("Item {index} failed validation: {source}")]
    ItemValidationFailed {
        index: usize,
        #[source]
        source: ItemError,
    },

    /// Reading a source or writing an artifact failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid or missing configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Caller supplied an unusable request (bad path, bad limit, unknown kind).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A requested file or artifact does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if the error only concerns a single item and the rest of
    /// the catalog is still usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::ItemValidationFailed { .. })
    }

    /// Returns true if the whole source was rejected.
    pub fn is_source_failure(&self) -> bool {
        matches!(self, AppError::SourceFormatUnrecognized(_))
    }
}

/// Why a single catalog item was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemError {
    /// A required field is absent or blank.
    #[error("missing required field `{0}`")]
    FieldMissingRequired(&'static str),

    /// A field is present but its value is unusable.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The item itself has the wrong shape (not an object, wrong field types).
    #[error("malformed item: {0}")]
    Malformed(String),
}

impl ItemError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ItemError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
