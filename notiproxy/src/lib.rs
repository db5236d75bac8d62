//! # notiproxy
//!
//! Runtime generation of change-notifying proxies for Rust types.
//!
//! Given a set of target types, notiproxy assembles the source of one
//! forwarding wrapper per type, compiles it in memory and caches the
//! result. Writing an eligible property through a proxy stores the value
//! in the wrapped object and then raises a property-changed notification
//! for the property and for every property it declares as dependent.
//!
//! ## Features
//!
//! - **`#[derive(Reflect)]`** - Describe target types with per-property options
//! - **Template-driven generation** - Proxy source built from embedded templates
//! - **In-memory compilation** - `syn`-based backend with line/column diagnostics
//! - **Type cache** - Every type compiled once per process, thread-safe
//! - **Build-time generation** - The same source from an XML type manifest
//!
//! ## Quick Start
//!
//! ```ignore
//! use notiproxy::prelude::*;
//!
//! #[derive(Default, Reflect)]
//! #[reflect(constructor(default))]
//! #[reflect(computed(name = "Shouted", ty = String, getter = shouted))]
//! pub struct Poco {
//!     #[reflect(overridable, depends_on = "Shouted")]
//!     value: String,
//! }
//!
//! let mut poco = notiproxy::get_proxy_instance::<Poco>(args![])?;
//! poco.property_changed()
//!     .subscribe(|e| println!("{} changed", e.property_name()));
//! poco.set("Value", Value::new("X".to_string()))?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Descriptors, values, notification and executable proxies
//! - [`schema`] - Reflection inspector and type manifests
//! - [`codegen`] - Templates, source assembly and the compiler backend

extern crate self as notiproxy;

pub mod cache;
pub mod error;
pub mod factory;
pub mod prelude;

pub use cache::TypeCache;
pub use error::{ProxyError, Result};
pub use factory::{Proxy, ProxyFactory, ProxyFactoryBuilder};

pub use notiproxy_core::args;
pub use notiproxy_core::notify;
pub use notiproxy_core::{
    ConstructorDescriptor, GeneratedType, NotifyPropertyChanged, ParameterDescriptor,
    PropertyChangedEventArgs, PropertyChangedHandlers, PropertyDescriptor, ProxyObject,
    ProxyTarget, Reflect, SubscriptionId, TargetType, TypeHandle, TypeRef, Value,
};
pub use notiproxy_derive::Reflect;

/// Core types and traits for reflection and proxies.
pub mod core {
    pub use notiproxy_core::*;
}

/// Reflection inspector and type manifests.
pub mod schema {
    pub use notiproxy_schema::*;
}

/// Proxy source generation and compilation.
pub mod codegen {
    pub use notiproxy_codegen::*;
}

#[doc(hidden)]
pub mod __private {
    pub use notiproxy_core::{
        Arguments, ConstructorDescriptor, Error, PropertyDescriptor, ProxyTarget, Reflect,
        Result, TargetType, TypeRef, Value, enclosing_path,
    };
}

use std::sync::{Arc, OnceLock};

static FACTORY: OnceLock<ProxyFactory> = OnceLock::new();

/// Returns the process-wide factory, creating it with default settings on
/// first use.
pub fn factory() -> &'static ProxyFactory {
    FACTORY.get_or_init(ProxyFactory::new)
}

/// Returns the proxy types for `handles` from the process-wide factory.
///
/// # Errors
/// See [`ProxyFactory::get_proxy_types`].
pub fn get_proxy_types(handles: &[TypeHandle]) -> Result<Vec<Arc<GeneratedType>>> {
    factory().get_proxy_types(handles)
}

/// Constructs a proxy of `T` with the process-wide factory.
///
/// # Errors
/// See [`ProxyFactory::get_proxy_instance`].
pub fn get_proxy_instance<T: ProxyTarget>(args: Vec<Value>) -> Result<Proxy<T>> {
    factory().get_proxy_instance::<T>(args)
}
