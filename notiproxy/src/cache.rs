//! Process-wide cache of generated proxy types.
//!
//! Every target type is compiled at most once. A single lock guards the
//! whole lookup, compile and install sequence, so concurrent requests for
//! the same type never compile it twice.

use crate::error::{ProxyError, Result};
use notiproxy_codegen::{CodegenError, ReferenceSet};
use notiproxy_core::{GeneratedType, TargetType, TypeHandle};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct CacheState {
    types: HashMap<TypeId, Arc<GeneratedType>>,
    paths: HashMap<String, TypeId>,
    references: ReferenceSet,
}

/// Cache mapping target types to their generated proxy types.
#[derive(Debug, Default)]
pub struct TypeCache {
    state: Mutex<CacheState>,
}

impl TypeCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the generated types for `handles`, compiling the missing ones.
    ///
    /// Distinct uncached types are described and handed to `compile` as one
    /// batch, in first-occurrence order, together with the reference set of
    /// every type described so far. `compile` must return one generated type
    /// per target, in the same order.
    ///
    /// # Arguments
    /// * `handles` - Requested target types, duplicates allowed
    /// * `compile` - Compiles one batch of targets
    ///
    /// # Returns
    /// One generated type per handle, in request order.
    ///
    /// # Errors
    /// Returns `ProxyError::AmbiguousPath` if two distinct types share a
    /// path, otherwise whatever `compile` returns. The cache is left
    /// unchanged on error.
    pub fn get_or_create<F>(
        &self,
        handles: &[TypeHandle],
        compile: F,
    ) -> Result<Vec<Arc<GeneratedType>>>
    where
        F: FnOnce(&[Arc<TargetType>], &ReferenceSet) -> Result<Vec<GeneratedType>>,
    {
        let mut state = self.state.lock();

        let mut missing: Vec<TypeHandle> = Vec::new();
        for handle in handles {
            if state.types.contains_key(&handle.id()) {
                tracing::debug!("Proxy cache hit for {}", handle.name());
            } else if !missing.contains(handle) {
                tracing::debug!("Proxy cache miss for {}", handle.name());
                missing.push(*handle);
            }
        }

        if !missing.is_empty() {
            let targets: Vec<Arc<TargetType>> =
                missing.iter().map(|h| Arc::new(h.describe())).collect();

            let mut paths = state.paths.clone();
            for (handle, target) in missing.iter().zip(&targets) {
                let path = target.qualified_name();
                match paths.get(&path) {
                    Some(id) if *id != handle.id() => {
                        return Err(ProxyError::AmbiguousPath { path });
                    }
                    Some(_) => {}
                    None => {
                        paths.insert(path, handle.id());
                    }
                }
            }

            let mut references = state.references.clone();
            for target in &targets {
                references.register(Arc::clone(target));
            }

            let compiled = match compile(&targets, &references) {
                Ok(compiled) => compiled,
                Err(e) => {
                    tracing::warn!(
                        "Proxy generation failed for {} type(s): {}",
                        missing.len(),
                        e
                    );
                    return Err(e);
                }
            };
            if compiled.len() != missing.len() {
                return Err(CodegenError::generation(format!(
                    "compiled {} type(s) for a batch of {}",
                    compiled.len(),
                    missing.len()
                ))
                .into());
            }

            tracing::info!("Compiled {} proxy type(s)", compiled.len());
            for (handle, ty) in missing.iter().zip(compiled) {
                state.types.insert(handle.id(), Arc::new(ty));
            }
            state.paths = paths;
            state.references = references;
        }

        handles
            .iter()
            .map(|handle| {
                state.types.get(&handle.id()).cloned().ok_or_else(|| {
                    ProxyError::from(CodegenError::generation(format!(
                        "no proxy type installed for {}",
                        handle.name()
                    )))
                })
            })
            .collect()
    }

    /// Returns true if a proxy type for `handle` is cached.
    #[must_use]
    pub fn contains(&self, handle: &TypeHandle) -> bool {
        self.state.lock().types.contains_key(&handle.id())
    }

    /// Returns the number of cached proxy types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().types.len()
    }

    /// Returns true if nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflect;
    use notiproxy_codegen::Diagnostics;
    use std::cell::Cell;

    #[derive(Debug, Default, Reflect)]
    #[reflect(constructor(default))]
    struct Alpha {
        #[reflect(overridable)]
        value: i32,
    }

    #[derive(Debug, Default, Reflect)]
    #[reflect(constructor(default))]
    struct Beta {
        #[reflect(overridable)]
        name: String,
    }

    fn passthrough(
        calls: &Cell<usize>,
    ) -> impl FnOnce(&[Arc<TargetType>], &ReferenceSet) -> Result<Vec<GeneratedType>> + '_ {
        move |targets: &[Arc<TargetType>], _: &ReferenceSet| {
            calls.set(calls.get() + 1);
            Ok(targets
                .iter()
                .map(|t| GeneratedType::new(format!("Proxy{}", t.name), Arc::clone(t)))
                .collect())
        }
    }

    #[test]
    fn test_request_order_and_duplicates() {
        let cache = TypeCache::new();
        let calls = Cell::new(0);
        let alpha = TypeHandle::of::<Alpha>();
        let beta = TypeHandle::of::<Beta>();

        let types = cache
            .get_or_create(&[beta, alpha, beta], passthrough(&calls))
            .unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["ProxyBeta", "ProxyAlpha", "ProxyBeta"]);
        assert!(Arc::ptr_eq(&types[0], &types[2]));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cached_types_not_recompiled() {
        let cache = TypeCache::new();
        let calls = Cell::new(0);
        let alpha = TypeHandle::of::<Alpha>();

        let first = cache.get_or_create(&[alpha], passthrough(&calls)).unwrap();
        let second = cache.get_or_create(&[alpha], passthrough(&calls)).unwrap();
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_only_missing_types_compiled() {
        let cache = TypeCache::new();
        let alpha = TypeHandle::of::<Alpha>();
        let beta = TypeHandle::of::<Beta>();
        cache
            .get_or_create(&[alpha], passthrough(&Cell::new(0)))
            .unwrap();

        let mut batch = Vec::new();
        cache
            .get_or_create(&[alpha, beta], |targets, references| {
                batch = targets.iter().map(|t| t.name.clone()).collect();
                assert!(references.lookup(&targets[0].qualified_name()).is_some());
                Ok(targets
                    .iter()
                    .map(|t| GeneratedType::new("P", Arc::clone(t)))
                    .collect())
            })
            .unwrap();
        assert_eq!(batch, vec!["Beta".to_string()]);
        assert!(cache.contains(&beta));
    }

    #[test]
    fn test_failure_leaves_cache_unchanged() {
        let cache = TypeCache::new();
        let alpha = TypeHandle::of::<Alpha>();
        let err = cache
            .get_or_create(&[alpha], |_, _| Err(ProxyError::Compilation(Diagnostics::new())))
            .unwrap_err();
        assert!(matches!(err, ProxyError::Compilation(_)));
        assert!(cache.is_empty());
        assert!(!cache.contains(&alpha));
    }

    #[test]
    fn test_short_batch_rejected() {
        let cache = TypeCache::new();
        let err = cache
            .get_or_create(
                &[TypeHandle::of::<Alpha>(), TypeHandle::of::<Beta>()],
                |_, _| Ok(Vec::new()),
            )
            .unwrap_err();
        assert!(matches!(err, ProxyError::Codegen(_)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_request() {
        let cache = TypeCache::new();
        let types = cache
            .get_or_create(&[], |_, _| panic!("nothing to compile"))
            .unwrap();
        assert!(types.is_empty());
    }

    #[test]
    fn test_types_sharing_a_path_rejected() {
        let first = {
            #[derive(Debug, Default, Reflect)]
            #[reflect(constructor(default))]
            struct Shadowed {
                #[reflect(overridable)]
                value: i32,
            }
            TypeHandle::of::<Shadowed>()
        };
        let second = {
            #[derive(Debug, Default, Reflect)]
            #[reflect(constructor(default))]
            struct Shadowed {
                #[reflect(overridable)]
                name: String,
            }
            TypeHandle::of::<Shadowed>()
        };
        let cache = TypeCache::new();
        let calls = Cell::new(0);

        let err = cache
            .get_or_create(&[first, second], passthrough(&calls))
            .unwrap_err();
        assert!(matches!(err, ProxyError::AmbiguousPath { .. }));
        assert_eq!(calls.get(), 0);
        assert!(cache.is_empty());

        cache.get_or_create(&[first], passthrough(&calls)).unwrap();
        let err = cache
            .get_or_create(&[second], passthrough(&calls))
            .unwrap_err();
        assert!(matches!(err, ProxyError::AmbiguousPath { .. }));
        assert_eq!(cache.len(), 1);
    }
}
