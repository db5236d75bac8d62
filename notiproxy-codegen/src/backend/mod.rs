//! Compiler backend.
//!
//! A backend turns the source text of a compilation unit into executable
//! proxy types, or reports why it cannot.

pub mod syn_backend;

pub use syn_backend::SynBackend;

use notiproxy_core::types::canonical_path;
use notiproxy_core::{GeneratedType, TargetType};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Crate roots every reference set knows.
pub const DEFAULT_CRATES: &[&str] = &["std", "core", "alloc", "notiproxy"];

/// Compiles source text into generated types.
pub trait CompilerBackend: Send + Sync {
    /// Compiles `source` against `references`.
    ///
    /// On success returns one generated type per proxy declaration, in the
    /// order the declarations appear in the source.
    ///
    /// # Errors
    /// Returns a non-empty `Diagnostics` list if the unit does not compile.
    fn compile(
        &self,
        source: &str,
        references: &ReferenceSet,
    ) -> Result<Vec<GeneratedType>, Diagnostics>;
}

/// A single compilation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Message text.
    pub message: String,
    /// 1-based line, 0 when unknown.
    pub line: usize,
    /// 1-based column, 0 when unknown.
    pub column: usize,
}

impl Diagnostic {
    /// Creates a diagnostic without a position.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: 0,
            column: 0,
        }
    }

    /// Creates a diagnostic at the start of `span`.
    pub fn at(span: proc_macro2::Span, message: impl Into<String>) -> Self {
        let start = span.start();
        Self {
            message: message.into(),
            line: start.line,
            column: start.column + 1,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "error: {}", self.message)
        } else {
            write!(f, "error[{}:{}]: {}", self.line, self.column, self.message)
        }
    }
}

/// Diagnostics of a failed compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the diagnostics in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Returns true if any message contains `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.iter().any(|d| d.message.contains(needle))
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

/// What generated code may refer to: known crate roots and registered
/// target types.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    crates: BTreeSet<String>,
    types: HashMap<String, Arc<TargetType>>,
}

impl Default for ReferenceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceSet {
    /// Creates a set knowing only the default crate roots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            crates: DEFAULT_CRATES.iter().map(|c| (*c).to_string()).collect(),
            types: HashMap::new(),
        }
    }

    /// Adds a crate root.
    pub fn add_crate(&mut self, name: impl Into<String>) {
        self.crates.insert(name.into());
    }

    /// Registers a target type together with the crate roots its members
    /// refer to.
    pub fn register(&mut self, target: Arc<TargetType>) {
        let mut namespaces = vec![target.module_path.clone()];
        for prop in &target.properties {
            prop.value_type.collect_namespaces(&mut namespaces);
            for index in &prop.index {
                index.ty.collect_namespaces(&mut namespaces);
            }
        }
        for ctor in &target.constructors {
            for param in &ctor.params {
                param.ty.collect_namespaces(&mut namespaces);
            }
        }
        for namespace in namespaces {
            if let Some(root) = namespace.split("::").next()
                && !root.is_empty()
            {
                self.crates.insert(root.to_string());
            }
        }
        self.types
            .insert(canonical_path(&target.qualified_name()), target);
    }

    /// Returns true if `root` is a known crate.
    #[must_use]
    pub fn has_crate(&self, root: &str) -> bool {
        self.crates.contains(root)
    }

    /// Looks up a registered type by qualified path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Arc<TargetType>> {
        self.types.get(&canonical_path(path))
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Returns the known crate roots in sorted order.
    pub fn crates(&self) -> impl Iterator<Item = &str> {
        self.crates.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notiproxy_core::{PropertyDescriptor, TypeRef};

    #[test]
    fn test_default_crates() {
        let refs = ReferenceSet::new();
        for root in DEFAULT_CRATES {
            assert!(refs.has_crate(root));
        }
        assert!(!refs.has_crate("demo"));
        assert_eq!(refs.type_count(), 0);
    }

    #[test]
    fn test_register_adds_roots() {
        let mut refs = ReferenceSet::new();
        refs.register(Arc::new(
            TargetType::new("Poco", "demo::model").property(PropertyDescriptor::new(
                "When",
                TypeRef::path("chrono::DateTime"),
            )),
        ));
        assert!(refs.has_crate("demo"));
        assert!(refs.has_crate("chrono"));
        assert!(refs.lookup("demo::model::Poco").is_some());
        assert!(refs.lookup("demo::Poco").is_none());
    }

    #[test]
    fn test_diagnostic_display() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new("first"));
        diags.push(Diagnostic {
            message: "second".to_string(),
            line: 3,
            column: 7,
        });
        assert_eq!(diags.to_string(), "error: first; error[3:7]: second");
        assert!(diags.mentions("sec"));
        assert_eq!(diags.len(), 2);
    }
}
