//! Template store.
//!
//! Proxy source is assembled from two text templates compiled into this
//! crate: the class skeleton and the property skeleton. Templates are looked
//! up by logical name, loaded at most once per store and never change after
//! loading.

use crate::error::CodegenError;
use crate::resolver::DEPENDENCY_PLACEHOLDER;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Logical name of the class skeleton.
pub const CLASS_TEMPLATE: &str = "proxy_class";
/// Logical name of the property skeleton.
pub const PROPERTY_TEMPLATE: &str = "proxy_property";

const TEMPLATE_EXTENSION: &str = ".rs.tmpl";

/// A named text resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedResource {
    /// Resource identifier, e.g. `notiproxy_codegen/templates/proxy_class.rs.tmpl`.
    pub id: &'static str,
    /// Resource content.
    pub text: &'static str,
}

const EMBEDDED: &[EmbeddedResource] = &[
    EmbeddedResource {
        id: "notiproxy_codegen/templates/proxy_class.rs.tmpl",
        text: include_str!("../templates/proxy_class.rs.tmpl"),
    },
    EmbeddedResource {
        id: "notiproxy_codegen/templates/proxy_property.rs.tmpl",
        text: include_str!("../templates/proxy_property.rs.tmpl"),
    },
];

/// A loaded template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    text: String,
}

impl Template {
    /// Creates a template from its resource name and text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Returns the resource identifier the template was loaded from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitutes `{{key}}` placeholders in one pass.
    ///
    /// Substituted values are not scanned again. The dependency placeholder
    /// (`{{dependencies}}` or `{{dependencies:method}}`) is kept verbatim for
    /// the dependency resolver. Text between braces that is not a placeholder
    /// key is copied unchanged.
    ///
    /// # Errors
    /// Returns `CodegenError::UnboundPlaceholder` if a placeholder has no
    /// binding.
    pub fn render(&self, bindings: &[(&str, &str)]) -> Result<String, CodegenError> {
        let mut out = String::with_capacity(self.text.len() * 2);
        let mut rest = self.text.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let key = &after[..end];

            if !is_placeholder_key(key) {
                out.push_str("{{");
                rest = after;
                continue;
            }

            if is_dependency_key(key) {
                out.push_str(&rest[start..start + end + 4]);
            } else {
                let value = bindings
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| CodegenError::UnboundPlaceholder {
                        template: self.name.clone(),
                        placeholder: key.to_string(),
                    })?;
                out.push_str(value);
            }
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

fn is_placeholder_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_dependency_key(key: &str) -> bool {
    key == DEPENDENCY_PLACEHOLDER
        || key
            .strip_prefix(DEPENDENCY_PLACEHOLDER)
            .is_some_and(|rest| rest.starts_with(':'))
}

/// Named template store with lazy, cached loading.
#[derive(Debug)]
pub struct TemplateStore {
    resources: Vec<EmbeddedResource>,
    loaded: Mutex<HashMap<String, Arc<Template>>>,
}

impl TemplateStore {
    /// Creates a store over the given resources.
    #[must_use]
    pub fn new(resources: Vec<EmbeddedResource>) -> Self {
        Self {
            resources,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a store over the templates compiled into this crate.
    #[must_use]
    pub fn with_embedded() -> Self {
        Self::new(EMBEDDED.to_vec())
    }

    /// Returns the process-wide store over the embedded templates.
    pub fn embedded() -> Arc<Self> {
        static STORE: OnceLock<Arc<TemplateStore>> = OnceLock::new();
        Arc::clone(STORE.get_or_init(|| Arc::new(Self::with_embedded())))
    }

    /// Returns the identifiers of every resource in table order.
    pub fn resource_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.iter().map(|r| r.id)
    }

    /// Returns how many templates have been loaded so far.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.lock().len()
    }

    /// Returns the template for a logical name, loading it on first use.
    ///
    /// A name resolves by exact identifier, then by path suffix, then by
    /// short name (`proxy_class` for `proxy_class.rs.tmpl`). When several
    /// resources match a suffix the first one in table order wins.
    ///
    /// # Errors
    /// Returns `CodegenError::UnresolvedTemplate` if no resource matches.
    pub fn get(&self, name: &str) -> Result<Arc<Template>, CodegenError> {
        let mut loaded = self.loaded.lock();
        if let Some(template) = loaded.get(name) {
            return Ok(Arc::clone(template));
        }

        let resource = self
            .resolve(name)
            .ok_or_else(|| CodegenError::UnresolvedTemplate {
                name: name.to_string(),
            })?;
        tracing::debug!("Loading template {} as {}", name, resource.id);

        let template = Arc::new(Template::new(resource.id, resource.text));
        loaded.insert(name.to_string(), Arc::clone(&template));
        Ok(template)
    }

    fn resolve(&self, name: &str) -> Option<&EmbeddedResource> {
        if name.is_empty() {
            return None;
        }
        if let Some(exact) = self.resources.iter().find(|r| r.id == name) {
            return Some(exact);
        }
        if let Some(suffix) = self.find_suffix(name) {
            return Some(suffix);
        }
        if name.ends_with(TEMPLATE_EXTENSION) {
            return None;
        }
        self.find_suffix(&format!("{name}{TEMPLATE_EXTENSION}"))
    }

    fn find_suffix(&self, suffix: &str) -> Option<&EmbeddedResource> {
        self.resources.iter().find(|r| {
            r.id
                .strip_suffix(suffix)
                .is_some_and(|head| head.is_empty() || head.ends_with('/'))
        })
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::with_embedded()
    }
}
