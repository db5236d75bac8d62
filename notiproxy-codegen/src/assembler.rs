//! Source assembler.
//!
//! Combines inspected types with the class and property templates into one
//! compilation unit declaring a proxy per type.

use crate::error::CodegenError;
use crate::resolver::resolve_dependencies;
use crate::templates::{CLASS_TEMPLATE, PROPERTY_TEMPLATE, Template, TemplateStore};
use notiproxy_core::{ConstructorDescriptor, PropertyDescriptor, TargetType};
use notiproxy_schema::InspectedType;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Header line of every compilation unit.
pub const GENERATED_HEADER: &str = "// @generated by notiproxy. Do not edit.";

/// Settings that shape the generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Name of the module wrapping every proxy.
    pub module_name: String,
    /// Prefix of generated type names.
    pub name_prefix: String,
    /// Namespace providing the change-notification capability.
    pub notify_namespace: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module_name: "notiproxy_generated".to_string(),
            name_prefix: "Notifying".to_string(),
            notify_namespace: "notiproxy::notify".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Sets the wrapping module name.
    #[must_use]
    pub fn module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    /// Sets the generated type name prefix.
    #[must_use]
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Sets the notification namespace.
    #[must_use]
    pub fn notify_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.notify_namespace = namespace.into();
        self
    }

    /// Returns the generated name for a target type.
    ///
    /// The enclosing path is appended as length-prefixed segments so that
    /// two types sharing a bare name in different modules or functions get
    /// different names: `demo::model::Poco` becomes
    /// `NotifyingPoco_4demo5model`.
    #[must_use]
    pub fn proxy_name(&self, target: &TargetType) -> String {
        let mut name = format!("{}{}", self.name_prefix, target.name);
        let segments: Vec<&str> = target
            .module_path
            .split("::")
            .filter(|s| !s.is_empty())
            .collect();
        if !segments.is_empty() {
            name.push('_');
            for segment in segments {
                name.push_str(&segment.len().to_string());
                name.push_str(segment);
            }
        }
        name
    }
}

/// One proxy declared by a compilation unit.
#[derive(Debug, Clone)]
pub struct ProxyDeclaration {
    /// Generated type name.
    pub name: String,
    /// Proxied type.
    pub target: Arc<TargetType>,
}

/// Source text of one generation batch.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Complete source text.
    pub source: String,
    /// Declared proxies in emission order.
    pub declarations: Vec<ProxyDeclaration>,
}

/// Assembles compilation units from inspected types.
#[derive(Debug, Clone)]
pub struct SourceAssembler {
    config: GeneratorConfig,
    templates: Arc<TemplateStore>,
}

impl SourceAssembler {
    /// Creates an assembler.
    #[must_use]
    pub fn new(config: GeneratorConfig, templates: Arc<TemplateStore>) -> Self {
        Self { config, templates }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Assembles one unit declaring a proxy per type, in input order.
    ///
    /// # Errors
    /// Returns `CodegenError` if a template cannot be resolved or rendered.
    pub fn assemble(&self, types: &[InspectedType]) -> Result<CompilationUnit, CodegenError> {
        let class = self.templates.get(CLASS_TEMPLATE)?;
        let property = self.templates.get(PROPERTY_TEMPLATE)?;

        let mut imports: BTreeSet<&str> = types
            .iter()
            .flat_map(|t| t.namespaces.iter().map(String::as_str))
            .collect();
        imports.insert(self.config.notify_namespace.as_str());

        let mut output = String::new();
        output.push_str(GENERATED_HEADER);
        output.push_str("\n\n");
        output.push_str("#[allow(non_camel_case_types, dead_code, unused_imports)]\n");
        output.push_str(&format!("pub mod {} {{\n", self.config.module_name));
        for namespace in &imports {
            output.push_str(&format!("    use {namespace}::*;\n"));
        }

        let mut declarations = Vec::with_capacity(types.len());
        for inspected in types {
            let name = self.config.proxy_name(&inspected.target);
            let block = self.render_proxy(&name, inspected, &class, &property)?;
            output.push('\n');
            output.push_str(&indent(&block));
            declarations.push(ProxyDeclaration {
                name,
                target: Arc::clone(&inspected.target),
            });
        }

        output.push_str("}\n");

        Ok(CompilationUnit {
            source: output,
            declarations,
        })
    }

    fn render_proxy(
        &self,
        name: &str,
        inspected: &InspectedType,
        class: &Template,
        property: &Template,
    ) -> Result<String, CodegenError> {
        let base = inspected.target.qualified_name();

        let mut constructors = String::new();
        for ctor in &inspected.constructors {
            constructors.push_str(&render_constructor(&base, ctor));
        }

        let mut properties = String::new();
        for prop in &inspected.properties {
            properties.push_str(&render_property(property, prop)?);
        }

        class.render(&[
            ("base_type", base.as_str()),
            ("proxy_name", name),
            ("constructors", constructors.as_str()),
            ("properties", properties.as_str()),
        ])
    }
}

/// Generates a pass-through constructor.
fn render_constructor(base: &str, ctor: &ConstructorDescriptor) -> String {
    let params: Vec<String> = ctor
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty.render_qualified()))
        .collect();
    let args: Vec<&str> = ctor.params.iter().map(|p| p.name.as_str()).collect();

    let mut output = String::new();
    output.push_str(&format!("    /// Forwards to `{}::{}`.\n", base, ctor.name));
    output.push_str(&format!(
        "    pub fn {}({}) -> Self {{\n",
        ctor.name,
        params.join(", ")
    ));
    output.push_str("        Self {\n");
    output.push_str(&format!(
        "            base: {}::{}({}),\n",
        base,
        ctor.name,
        args.join(", ")
    ));
    output.push_str("            property_changed: PropertyChangedHandlers::new(),\n");
    output.push_str("        }\n");
    output.push_str("    }\n\n");
    output
}

/// Generates an intercepted setter from the property template.
///
/// Value and index types are written fully qualified so that names brought
/// in by the namespace globs cannot shadow them.
fn render_property(
    template: &Template,
    prop: &PropertyDescriptor,
) -> Result<String, CodegenError> {
    let value_name = if prop.index.iter().any(|i| i.name == "value") {
        "new_value"
    } else {
        "value"
    };

    let mut params: Vec<String> = prop
        .index
        .iter()
        .map(|i| format!("{}: {}", i.name, i.ty.render_qualified()))
        .collect();
    params.push(format!("{}: {}", value_name, prop.value_type.render_qualified()));

    let mut args: Vec<&str> = prop.index.iter().map(|i| i.name.as_str()).collect();
    args.push(value_name);

    let literal = format!("{:?}", prop.name);
    let params = params.join(", ");
    let args = args.join(", ");
    let rendered = template.render(&[
        ("property", prop.name.as_str()),
        ("property_literal", literal.as_str()),
        ("setter", prop.setter.as_str()),
        ("params", params.as_str()),
        ("args", args.as_str()),
    ])?;
    Ok(resolve_dependencies(&rendered, prop))
}

fn indent(block: &str) -> String {
    let mut out = String::with_capacity(block.len() + block.len() / 8);
    for line in block.lines() {
        if !line.is_empty() {
            out.push_str("    ");
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
