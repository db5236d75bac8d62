//! Proxy factory.
//!
//! Ties the generator, a compiler backend and the type cache together and
//! exposes the request-types and construct-instance entry points.

use crate::cache::TypeCache;
use crate::error::{ProxyError, Result};
use notiproxy_codegen::{
    CodegenError, CompilerBackend, Generator, GeneratorConfig, ReferenceSet, SynBackend,
    TemplateStore,
};
use notiproxy_core::{GeneratedType, ProxyObject, ProxyTarget, TargetType, TypeHandle, Value};
use std::fmt;
use std::sync::Arc;

/// A proxy whose base object is statically known to be a `T`.
pub type Proxy<T> = ProxyObject<T>;

/// Builder for a [`ProxyFactory`].
pub struct ProxyFactoryBuilder {
    config: GeneratorConfig,
    templates: Option<Arc<TemplateStore>>,
    backend: Option<Box<dyn CompilerBackend>>,
}

impl ProxyFactoryBuilder {
    /// Creates a builder with the default configuration, the embedded
    /// templates and the `syn` backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GeneratorConfig::default(),
            templates: None,
            backend: None,
        }
    }

    /// Sets the generator configuration.
    #[must_use]
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the template store.
    #[must_use]
    pub fn templates(mut self, templates: Arc<TemplateStore>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Sets the compiler backend.
    #[must_use]
    pub fn backend(mut self, backend: Box<dyn CompilerBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Builds the factory.
    #[must_use]
    pub fn build(self) -> ProxyFactory {
        let templates = self.templates.unwrap_or_else(TemplateStore::embedded);
        ProxyFactory {
            generator: Generator::new(self.config, templates),
            backend: self
                .backend
                .unwrap_or_else(|| Box::new(SynBackend::new())),
            cache: TypeCache::new(),
        }
    }
}

impl Default for ProxyFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates, compiles and caches proxy types.
pub struct ProxyFactory {
    generator: Generator,
    backend: Box<dyn CompilerBackend>,
    cache: TypeCache,
}

impl ProxyFactory {
    /// Creates a factory with default settings.
    #[must_use]
    pub fn new() -> Self {
        ProxyFactoryBuilder::new().build()
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder() -> ProxyFactoryBuilder {
        ProxyFactoryBuilder::new()
    }

    /// Returns the generator configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        self.generator.config()
    }

    /// Returns the type cache.
    #[must_use]
    pub fn cache(&self) -> &TypeCache {
        &self.cache
    }

    /// Returns the proxy types for `handles`, in request order.
    ///
    /// Types not yet cached are generated and compiled in one batch; a
    /// failure compiles nothing and caches nothing.
    ///
    /// # Errors
    /// Returns `ProxyError::Compilation` with the backend diagnostics if
    /// the batch does not compile, or `ProxyError::Codegen` if the source
    /// cannot be assembled.
    pub fn get_proxy_types(&self, handles: &[TypeHandle]) -> Result<Vec<Arc<GeneratedType>>> {
        self.cache
            .get_or_create(handles, |targets, references| {
                self.compile(targets, references)
            })
    }

    /// Returns the proxy type for `T`.
    ///
    /// # Errors
    /// See [`ProxyFactory::get_proxy_types`].
    pub fn get_proxy_type<T: ProxyTarget>(&self) -> Result<Arc<GeneratedType>> {
        let handle = TypeHandle::of::<T>();
        self.get_proxy_types(&[handle])?
            .into_iter()
            .next()
            .ok_or_else(|| missing_type(&handle))
    }

    /// Constructs a proxy of `T`, forwarding `args` to the first base
    /// constructor whose parameters match them.
    ///
    /// # Errors
    /// Returns `ProxyError::Core` wrapping `ConstructionMismatch` if no
    /// constructor matches, or the proxy type error.
    pub fn get_proxy_instance<T: ProxyTarget>(&self, args: Vec<Value>) -> Result<Proxy<T>> {
        let ty = self.get_proxy_type::<T>()?;
        let proxy = ty.instantiate(args)?;
        proxy
            .downcast::<T>()
            .map_err(|_| ProxyError::BaseTypeMismatch {
                proxy: ty.name().to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Constructs a proxy of the type named by `handle`.
    ///
    /// # Errors
    /// Same as [`ProxyFactory::get_proxy_instance`].
    pub fn create_instance(&self, handle: TypeHandle, args: Vec<Value>) -> Result<ProxyObject> {
        let ty = self
            .get_proxy_types(&[handle])?
            .into_iter()
            .next()
            .ok_or_else(|| missing_type(&handle))?;
        Ok(ty.instantiate(args)?)
    }

    /// Returns the source the factory would compile for `handles`,
    /// bypassing the cache.
    ///
    /// # Errors
    /// Returns `ProxyError::Codegen` if the source cannot be assembled.
    pub fn generate_source(&self, handles: &[TypeHandle]) -> Result<String> {
        let mut distinct: Vec<&TypeHandle> = Vec::new();
        for handle in handles {
            if !distinct.contains(&handle) {
                distinct.push(handle);
            }
        }
        let targets: Vec<Arc<TargetType>> =
            distinct.iter().map(|h| Arc::new(h.describe())).collect();
        Ok(self.generator.generate(&targets)?.source)
    }

    fn compile(
        &self,
        targets: &[Arc<TargetType>],
        references: &ReferenceSet,
    ) -> Result<Vec<GeneratedType>> {
        let unit = self.generator.generate(targets)?;
        tracing::debug!(
            "Compiling {} proxy declaration(s) against {} known type(s)",
            unit.declarations.len(),
            references.type_count()
        );
        self.backend
            .compile(&unit.source, references)
            .map_err(ProxyError::Compilation)
    }
}

impl Default for ProxyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("config", self.config())
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

fn missing_type(handle: &TypeHandle) -> ProxyError {
    CodegenError::generation(format!("no proxy type returned for {}", handle.name())).into()
}
