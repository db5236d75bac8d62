//! Manifest validation utilities.
//!
//! A manifest that parses can still describe things no proxy can be built
//! for. The checks here run before any source is generated.

use crate::error::SchemaError;
use crate::parser::Manifest;
use notiproxy_core::TargetType;
use std::collections::HashSet;

/// Validates a parsed manifest for consistency.
///
/// # Arguments
/// * `manifest` - The manifest to validate
///
/// # Returns
/// Ok(()) if valid, or SchemaError describing the first issue found.
///
/// # Errors
/// Returns `SchemaError` if a type, property, constructor or parameter is
/// declared twice, or if a name is empty.
pub fn validate_manifest(manifest: &Manifest) -> Result<(), SchemaError> {
    let mut seen_types = HashSet::new();
    for target in &manifest.types {
        if !seen_types.insert(target.qualified_name()) {
            return Err(SchemaError::duplicate(
                "type",
                &target.name,
                target.module_path.as_str(),
            ));
        }
        validate_type(target)?;
    }
    Ok(())
}

/// Validates a single type definition.
fn validate_type(target: &TargetType) -> Result<(), SchemaError> {
    if target.name.is_empty() {
        return Err(SchemaError::Validation {
            message: format!("type in module '{}' has an empty name", target.module_path),
        });
    }

    let owner = target.qualified_name();
    let mut properties = HashSet::new();
    for prop in &target.properties {
        if prop.name.is_empty() {
            return Err(SchemaError::Validation {
                message: format!("property with an empty name in '{owner}'"),
            });
        }
        if !properties.insert(prop.name.as_str()) {
            return Err(SchemaError::duplicate("property", &prop.name, &owner));
        }
        check_parameters(prop.index.iter().map(|p| p.name.as_str()), &prop.name)?;
    }

    let mut constructors = HashSet::new();
    for ctor in &target.constructors {
        if !constructors.insert(ctor.name.as_str()) {
            return Err(SchemaError::duplicate("constructor", &ctor.name, &owner));
        }
        check_parameters(
            ctor.params.iter().map(|p| p.name.as_str()),
            &format!("{owner}::{}", ctor.name),
        )?;
    }

    Ok(())
}

fn check_parameters<'a>(
    names: impl Iterator<Item = &'a str>,
    owner: &str,
) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SchemaError::duplicate("parameter", name, owner));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_manifest;

    fn check(xml: &str) -> Result<(), SchemaError> {
        validate_manifest(&parse_manifest(xml).unwrap())
    }

    #[test]
    fn test_valid_manifest() {
        let xml = r#"<proxyManifest>
            <type name="Poco" module="demo">
                <constructor name="new"><param name="value" type="String"/></constructor>
                <property name="Value" type="String" overridable="true"/>
            </type>
            <type name="Poco" module="other"/>
        </proxyManifest>"#;
        assert!(check(xml).is_ok());
    }

    #[test]
    fn test_duplicate_type() {
        let xml = r#"<proxyManifest>
            <type name="Poco" module="demo"/>
            <type name="Poco" module="demo"/>
        </proxyManifest>"#;
        let err = check(xml).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate { kind: "type", .. }));
    }

    #[test]
    fn test_duplicate_property() {
        let xml = r#"<proxyManifest>
            <type name="Poco" module="demo">
                <property name="Value" type="String"/>
                <property name="Value" type="u32"/>
            </type>
        </proxyManifest>"#;
        let err = check(xml).unwrap_err();
        assert_eq!(err.to_string(), "duplicate property 'Value' in 'demo::Poco'");
    }

    #[test]
    fn test_duplicate_constructor() {
        let xml = r#"<proxyManifest>
            <type name="Poco" module="demo">
                <constructor name="new"/>
                <constructor name="new"><param name="a" type="u8"/></constructor>
            </type>
        </proxyManifest>"#;
        let err = check(xml).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate { kind: "constructor", .. }));
    }

    #[test]
    fn test_duplicate_parameter() {
        let xml = r#"<proxyManifest>
            <type name="Poco" module="demo">
                <constructor name="new">
                    <param name="a" type="u8"/>
                    <param name="a" type="u16"/>
                </constructor>
            </type>
        </proxyManifest>"#;
        let err = check(xml).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate { kind: "parameter", .. }));
    }

    #[test]
    fn test_duplicate_index_parameter() {
        let xml = r#"<proxyManifest>
            <type name="Grid" module="demo">
                <property name="Cell" type="u32" overridable="true">
                    <index name="i" type="usize"/>
                    <index name="i" type="usize"/>
                </property>
            </type>
        </proxyManifest>"#;
        let err = check(xml).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate { kind: "parameter", .. }));
    }
}
