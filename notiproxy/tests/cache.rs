use notiproxy::codegen::ReferenceSet;
use notiproxy::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;

#[derive(Debug, Default, Reflect)]
#[reflect(constructor(default))]
pub struct Account {
    #[reflect(overridable)]
    balance: i64,
}

#[derive(Debug, Default, Reflect)]
#[reflect(constructor(default))]
pub struct Ledger {
    #[reflect(overridable)]
    entries: Vec<String>,
}

/// Backend that counts compilations and delegates to `SynBackend`.
struct CountingBackend {
    calls: Arc<AtomicUsize>,
    inner: SynBackend,
}

impl CompilerBackend for CountingBackend {
    fn compile(
        &self,
        source: &str,
        references: &ReferenceSet,
    ) -> Result<Vec<GeneratedType>, Diagnostics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.compile(source, references)
    }
}

fn counting_factory() -> (ProxyFactory, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let factory = ProxyFactory::builder()
        .backend(Box::new(CountingBackend {
            calls: Arc::clone(&calls),
            inner: SynBackend::new(),
        }))
        .build();
    (factory, calls)
}

#[test]
fn test_duplicates_compiled_once() {
    let (factory, calls) = counting_factory();
    let account = TypeHandle::of::<Account>();

    let types = factory
        .get_proxy_types(&[account, account, account])
        .unwrap();

    assert_eq!(types.len(), 3);
    assert!(types.iter().all(|t| Arc::ptr_eq(t, &types[0])));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(factory.cache().len(), 1);
}

#[test]
fn test_repeated_requests_hit_cache() {
    let (factory, calls) = counting_factory();
    let account = TypeHandle::of::<Account>();
    let ledger = TypeHandle::of::<Ledger>();

    factory.get_proxy_types(&[account]).unwrap();
    factory.get_proxy_types(&[account]).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    factory.get_proxy_types(&[ledger, account]).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    factory.get_proxy_types(&[account, ledger]).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_requests_compile_once() {
    let (factory, calls) = counting_factory();
    let barrier = Barrier::new(4);

    let results: Vec<Arc<GeneratedType>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    factory
                        .get_proxy_types(&[TypeHandle::of::<Ledger>()])
                        .unwrap()
                        .remove(0)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|t| Arc::ptr_eq(t, &results[0])));
}

#[test]
fn test_instances_share_type_but_not_listeners() {
    let (factory, _) = counting_factory();
    let mut first = factory.get_proxy_instance::<Account>(args![]).unwrap();
    let second = factory.get_proxy_instance::<Account>(args![]).unwrap();
    assert!(Arc::ptr_eq(first.generated_type(), second.generated_type()));

    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);
    second.property_changed().subscribe(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    first.set("Balance", Value::new(10_i64)).unwrap();
    assert_eq!(first.balance, 10);
    assert_eq!(second.balance, 0);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_custom_module_name() {
    let config = GeneratorConfig::default().module_name("proxies");
    let factory = ProxyFactory::builder().config(config).build();

    let source = factory
        .generate_source(&[TypeHandle::of::<Account>()])
        .unwrap();
    assert!(source.contains("pub mod proxies {"));
    factory.get_proxy_type::<Account>().unwrap();
}
