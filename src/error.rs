//! Error types for tree building and sampling
//!
//! Every failure the engine can produce surfaces through [`GenerationError`].
//! Tree-build failures are returned when a builder is created; everything else is
//! returned from `sample()`.

/// Type alias for generation results
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Errors raised while describing, resolving or sampling a value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// No construction strategy can handle a type reachable from the root
    #[error("Unsupported type: no construction strategy handles `{type_name}`")]
    UnsupportedType { type_name: String },

    /// An explicit or lazily resolved map key evaluated to null
    #[error("Map key cannot be null. (at `{path}`)")]
    NullMapKey { path: String },

    /// Generated keys (or set elements) kept colliding with existing ones
    #[error("Could not generate a unique key at `{path}` after {attempts} attempts")]
    DuplicateKeyExhausted { path: String, attempts: u32 },

    /// Post-conditions rejected every candidate
    #[error("Post-condition at `{path}` not satisfied after {attempts} attempts")]
    PostConditionExhausted { path: String, attempts: u32 },

    /// The construction strategy rejected the assembled children
    #[error("Failed to construct `{type_name}`: {message}")]
    Construction { type_name: String, message: String },

    /// A path expression string could not be parsed
    #[error("Invalid path expression `{expression}`: {reason}")]
    InvalidPath { expression: String, reason: String },

    /// A sampled value could not be converted into the requested Rust type
    #[error("Conversion error: {0}")]
    Conversion(String),
}

impl GenerationError {
    pub fn construction(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        GenerationError::Construction {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_path(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerationError::InvalidPath {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::Conversion(err.to_string())
    }
}
