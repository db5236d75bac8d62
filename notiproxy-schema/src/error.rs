//! Error types for manifest parsing and validation.

use thiserror::Error;

/// Error type for manifest parsing operations.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Type reference that does not parse.
    #[error("invalid type: {0}")]
    Type(#[from] notiproxy_core::Error),

    /// Invalid manifest structure.
    #[error("invalid manifest structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Error type for manifest validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Duplicate definition.
    #[error("duplicate {kind} '{name}' in '{owner}'")]
    Duplicate {
        /// Kind of definition (type, property, constructor, parameter).
        kind: &'static str,
        /// Name of the duplicate.
        name: String,
        /// Enclosing definition.
        owner: String,
    },

    /// Validation error.
    #[error("validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

impl SchemaError {
    /// Creates a duplicate definition error.
    pub fn duplicate(kind: &'static str, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            name: name.into(),
            owner: owner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_manifest;

    #[test]
    fn test_missing_attribute_message() {
        let err = parse_manifest("<proxyManifest><type module=\"demo\"/></proxyManifest>")
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingAttribute { .. }));
        assert_eq!(
            err.to_string(),
            "missing required attribute 'name' on element 'type'"
        );
    }

    #[test]
    fn test_duplicate_message() {
        let err = SchemaError::duplicate("type", "Poco", "demo");
        assert_eq!(err.to_string(), "duplicate type 'Poco' in 'demo'");
    }
}
