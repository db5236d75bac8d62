//! Prelude module for convenient imports.
//!
//! ```ignore
//! use notiproxy::prelude::*;
//! ```

pub use crate::args;
pub use crate::{Proxy, ProxyError, ProxyFactory, ProxyFactoryBuilder, TypeCache};
pub use crate::{get_proxy_instance, get_proxy_types};

// Core types
pub use notiproxy_core::{
    GeneratedType, NotifyPropertyChanged, PropertyChangedEventArgs, ProxyObject, ProxyTarget,
    Reflect, TypeHandle, Value,
};
pub use notiproxy_derive::Reflect;

// Codegen types
pub use notiproxy_codegen::{CompilerBackend, Diagnostics, GeneratorConfig, SynBackend};
