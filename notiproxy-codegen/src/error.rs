//! Error types for proxy generation.

use crate::backend::Diagnostics;
use thiserror::Error;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Manifest parsing error.
    #[error("manifest parse error: {0}")]
    Parse(#[from] notiproxy_schema::ParseError),

    /// Manifest validation error.
    #[error("manifest error: {0}")]
    Schema(#[from] notiproxy_schema::SchemaError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Template name not found among the embedded resources.
    #[error("unresolved template '{name}'")]
    UnresolvedTemplate {
        /// Requested logical name.
        name: String,
    },

    /// Template placeholder without a binding.
    #[error("no binding for placeholder '{placeholder}' in template '{template}'")]
    UnboundPlaceholder {
        /// Template resource name.
        template: String,
        /// Placeholder key.
        placeholder: String,
    },

    /// The compiler backend rejected the compilation unit.
    #[error("compilation failed: {0}")]
    Compilation(#[from] Diagnostics),

    /// Code generation error.
    #[error("generation error: {message}")]
    Generation {
        /// Error message.
        message: String,
    },
}

impl CodegenError {
    /// Creates a generation error with the given message.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}
