//! Error types for notiproxy core operations.

use thiserror::Error;

/// Core error type for reflection and proxy operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The property does not exist on the type.
    #[error("type '{type_name}' has no property '{property}'")]
    UnknownProperty {
        /// Type name.
        type_name: String,
        /// Property name.
        property: String,
    },

    /// The property has no mutator.
    #[error("property '{property}' of '{type_name}' is read-only")]
    ReadOnlyProperty {
        /// Type name.
        type_name: String,
        /// Property name.
        property: String,
    },

    /// The property has no accessor.
    #[error("property '{property}' of '{type_name}' is write-only")]
    WriteOnlyProperty {
        /// Type name.
        type_name: String,
        /// Property name.
        property: String,
    },

    /// A value of the wrong type was supplied.
    #[error("type mismatch for '{context}': expected {expected}, actual {actual}")]
    TypeMismatch {
        /// Property or parameter receiving the value.
        context: String,
        /// Expected type name.
        expected: String,
        /// Actual type name.
        actual: String,
    },

    /// Indexed access on a property that takes no index, or the reverse.
    #[error("property '{property}' of '{type_name}' does not support this kind of indexing")]
    NotIndexed {
        /// Type name.
        type_name: String,
        /// Property name.
        property: String,
    },

    /// A constructor received fewer arguments than it declares.
    #[error("missing argument '{name}'")]
    MissingArgument {
        /// Parameter name.
        name: String,
    },

    /// No constructor matches the supplied arguments.
    #[error("no constructor of '{type_name}' accepts ({arguments}); candidates: {candidates}")]
    ConstructionMismatch {
        /// Type name.
        type_name: String,
        /// Supplied argument type names.
        arguments: String,
        /// Available constructor signatures.
        candidates: String,
    },

    /// The constructor was described without a runtime invoker.
    #[error("constructor '{constructor}' of '{type_name}' has no runtime invoker")]
    ConstructorNotLinked {
        /// Type name.
        type_name: String,
        /// Constructor name.
        constructor: String,
    },

    /// A type name could not be parsed.
    #[error("invalid type name '{name}': {reason}")]
    InvalidTypeName {
        /// Offending text.
        name: String,
        /// Why parsing failed.
        reason: String,
    },
}

impl Error {
    /// Creates an unknown property error.
    pub fn unknown_property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Creates a read-only property error.
    pub fn read_only(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::ReadOnlyProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Creates a write-only property error.
    pub fn write_only(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::WriteOnlyProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Creates a not-indexed error.
    pub fn not_indexed(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::NotIndexed {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type alias for notiproxy core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_property_display() {
        let err = Error::unknown_property("Poco", "Missing");
        let msg = err.to_string();
        assert!(msg.contains("Poco"));
        assert!(msg.contains("Missing"));
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = Error::type_mismatch("Value", "alloc::string::String", "i32");
        let msg = err.to_string();
        assert!(msg.contains("type mismatch"));
        assert!(msg.contains("i32"));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(Error::read_only("A", "B"), Error::read_only("A", "B"));
        assert_ne!(Error::read_only("A", "B"), Error::write_only("A", "B"));
    }
}
