//! # notiproxy Codegen
//!
//! Proxy source generation and in-memory compilation.
//!
//! This crate provides:
//! - The template store and the embedded proxy templates
//! - Dependency annotation resolution
//! - Source assembly of one compilation unit per batch
//! - A `syn`-based compiler backend lowering proxies into executable types
//! - Build script integration from type manifests

pub mod assembler;
pub mod backend;
pub mod error;
pub mod generator;
pub mod resolver;
pub mod templates;

pub use assembler::{CompilationUnit, GeneratorConfig, ProxyDeclaration, SourceAssembler};
pub use backend::{CompilerBackend, Diagnostic, Diagnostics, ReferenceSet, SynBackend};
pub use error::CodegenError;
pub use generator::Generator;
pub use resolver::resolve_dependencies;
pub use templates::{EmbeddedResource, Template, TemplateStore};

use std::sync::Arc;

/// Generates proxy source from a type manifest string.
///
/// # Arguments
/// * `xml` - Type manifest content
///
/// # Returns
/// Generated Rust code as a string.
///
/// # Errors
/// Returns `CodegenError` if parsing, validation or compilation fails.
pub fn generate_from_manifest(xml: &str) -> Result<String, CodegenError> {
    let manifest = notiproxy_schema::parse_manifest(xml)?;
    notiproxy_schema::validate_manifest(&manifest)?;
    let targets: Vec<_> = manifest.types.into_iter().map(Arc::new).collect();
    let unit = Generator::default().generate_checked(&targets, &SynBackend::new())?;
    Ok(unit.source)
}

/// Generates proxy source from a type manifest file.
///
/// # Arguments
/// * `path` - Path to the manifest file
///
/// # Returns
/// Generated Rust code as a string.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, validation or compilation
/// fails.
pub fn generate_from_file(path: &std::path::Path) -> Result<String, CodegenError> {
    let xml = std::fs::read_to_string(path)?;
    generate_from_manifest(&xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<proxyManifest>
    <type name="Poco" module="demo::model">
        <constructor name="new">
            <param name="value" type="std::string::String"/>
        </constructor>
        <property name="Value" type="std::string::String" overridable="true">
            <dependsOn>DependantOnValue</dependsOn>
        </property>
        <property name="ShouldNotBeProxied" type="std::string::String" overridable="true" noProxy="true"/>
        <property name="DependantOnValue" type="std::string::String" writable="false"/>
    </type>
</proxyManifest>"#;

    #[test]
    fn test_generate_from_manifest() {
        let code = generate_from_manifest(MANIFEST).unwrap();
        assert!(code.contains("pub struct NotifyingPoco_4demo5model"));
        assert!(code.contains("self.on_property_changed(\"DependantOnValue\");"));
        assert!(!code.contains("set_should_not_be_proxied"));
    }

    #[test]
    fn test_manifest_types_survive_glob_imports() {
        let xml = r#"<proxyManifest>
    <type name="Report" module="demo">
        <property name="Alignment" type="std::fmt::Alignment" overridable="true"/>
        <property name="Outcome" type="std::result::Result&lt;u32, std::string::String&gt;" overridable="true"/>
    </type>
</proxyManifest>"#;
        let code = generate_from_manifest(xml).unwrap();
        assert!(code.contains("use std::fmt::*;"));
        assert!(code.contains("use std::result::*;"));
        assert!(code.contains(
            "pub fn set_outcome(&mut self, value: std::result::Result<u32, std::string::String>)"
        ));
        assert!(code.contains("pub fn set_alignment(&mut self, value: std::fmt::Alignment)"));
    }

    #[test]
    fn test_generate_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        let code = generate_from_file(file.path()).unwrap();
        assert!(code.starts_with(assembler::GENERATED_HEADER));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate_from_file(&dir.path().join("missing.xml")).unwrap_err();
        assert!(matches!(err, CodegenError::Io(_)));
    }

    #[test]
    fn test_invalid_dependency_in_manifest() {
        let xml = MANIFEST.replace("<dependsOn>DependantOnValue</dependsOn>", "<dependsOn>Nope</dependsOn>");
        let err = generate_from_manifest(&xml).unwrap_err();
        assert!(matches!(err, CodegenError::Compilation(_)));
    }

    #[test]
    fn test_duplicate_type_in_manifest() {
        let xml = MANIFEST.replace(
            "</proxyManifest>",
            "<type name=\"Poco\" module=\"demo::model\"/></proxyManifest>",
        );
        let err = generate_from_manifest(&xml).unwrap_err();
        assert!(matches!(err, CodegenError::Schema(_)));
    }
}
