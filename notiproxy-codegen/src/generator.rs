//! Proxy source generator.
//!
//! Runs the inspector over each target type and hands the results to the
//! source assembler, optionally checking the unit with a compiler backend.

use crate::assembler::{CompilationUnit, GeneratorConfig, SourceAssembler};
use crate::backend::{CompilerBackend, ReferenceSet};
use crate::error::CodegenError;
use crate::templates::TemplateStore;
use notiproxy_core::TargetType;
use notiproxy_schema::{InspectedType, inspect};
use std::sync::Arc;

/// Generates compilation units for batches of target types.
#[derive(Debug, Clone)]
pub struct Generator {
    assembler: SourceAssembler,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default(), TemplateStore::embedded())
    }
}

impl Generator {
    /// Creates a new generator.
    #[must_use]
    pub fn new(config: GeneratorConfig, templates: Arc<TemplateStore>) -> Self {
        Self {
            assembler: SourceAssembler::new(config, templates),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        self.assembler.config()
    }

    /// Generates the compilation unit for `targets`, in order.
    ///
    /// # Errors
    /// Returns `CodegenError` if a template cannot be resolved or rendered.
    pub fn generate(&self, targets: &[Arc<TargetType>]) -> Result<CompilationUnit, CodegenError> {
        let inspected: Vec<InspectedType> = targets.iter().map(inspect).collect();
        let candidates: usize = inspected.iter().map(|t| t.properties.len()).sum();
        tracing::debug!(
            "Assembling {} proxy type(s) with {} intercepted propert(ies)",
            inspected.len(),
            candidates
        );
        self.assembler.assemble(&inspected)
    }

    /// Generates the unit for `targets` and checks it with `backend`.
    ///
    /// The reference set is built from `targets` alone.
    ///
    /// # Errors
    /// Returns `CodegenError::Compilation` with the backend diagnostics if
    /// the unit does not compile.
    pub fn generate_checked(
        &self,
        targets: &[Arc<TargetType>],
        backend: &dyn CompilerBackend,
    ) -> Result<CompilationUnit, CodegenError> {
        let unit = self.generate(targets)?;
        let mut references = ReferenceSet::new();
        for target in targets {
            references.register(Arc::clone(target));
        }
        let compiled = backend.compile(&unit.source, &references)?;
        if compiled.len() != unit.declarations.len() {
            return Err(CodegenError::generation(format!(
                "backend returned {} type(s) for {} declaration(s)",
                compiled.len(),
                unit.declarations.len()
            )));
        }
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SynBackend;
    use notiproxy_core::{PropertyDescriptor, TypeRef};

    fn target(name: &str, sealed: bool) -> Arc<TargetType> {
        Arc::new(
            TargetType::new(name, "demo")
                .sealed(sealed)
                .property(PropertyDescriptor::new("Value", TypeRef::of::<i64>()).overridable(true)),
        )
    }

    #[test]
    fn test_generate_declarations_in_order() {
        let unit = Generator::default()
            .generate(&[target("B", false), target("A", false)])
            .unwrap();
        let names: Vec<&str> = unit.declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["NotifyingB_4demo", "NotifyingA_4demo"]);
    }

    #[test]
    fn test_generate_checked() {
        let unit = Generator::default()
            .generate_checked(&[target("A", false)], &SynBackend::new())
            .unwrap();
        assert!(unit.source.contains("pub fn set_value(&mut self, value: i64)"));
    }

    #[test]
    fn test_generate_checked_sealed() {
        let err = Generator::default()
            .generate_checked(&[target("A", false), target("B", true)], &SynBackend::new())
            .unwrap_err();
        match err {
            CodegenError::Compilation(diags) => assert!(diags.mentions("sealed type `demo::B`")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
