//! Error types for proxy factory operations.

use notiproxy_codegen::{CodegenError, Diagnostics};
use thiserror::Error;

/// Error type for proxy factory operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Source generation error.
    #[error("code generation error: {0}")]
    Codegen(#[from] CodegenError),

    /// Reflection or construction error.
    #[error(transparent)]
    Core(#[from] notiproxy_core::Error),

    /// The compiler backend rejected the batch.
    #[error("proxy compilation failed: {0}")]
    Compilation(Diagnostics),

    /// Two distinct target types describe themselves with the same path.
    #[error("more than one target type is named '{path}'")]
    AmbiguousPath {
        /// Shared qualified path.
        path: String,
    },

    /// A proxy was constructed around a base object of another type.
    #[error("proxy '{proxy}' does not wrap a '{expected}'")]
    BaseTypeMismatch {
        /// Generated type name.
        proxy: String,
        /// Requested base type.
        expected: &'static str,
    },
}

impl ProxyError {
    /// Returns the backend diagnostics if this is a compilation failure.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Compilation(diagnostics) => Some(diagnostics),
            Self::Codegen(CodegenError::Compilation(diagnostics)) => Some(diagnostics),
            _ => None,
        }
    }
}

/// Result type alias for proxy factory operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
