//! # notiproxy Core
//!
//! Core types and traits for change-notifying proxies.
//!
//! This crate provides:
//! - Reflection descriptors for proxy targets (types, properties, constructors)
//! - Structured type references and their namespace closure
//! - Type-erased values and constructor argument readers
//! - The `Reflect` / `ProxyTarget` traits implemented by targets
//! - The property-changed notification capability
//! - Executable generated types and proxy instances

pub mod descriptor;
pub mod error;
pub mod notify;
pub mod proxy;
pub mod reflect;
pub mod types;
pub mod value;

pub use descriptor::{
    ConstructorDescriptor, Invoker, ParameterDescriptor, PropertyDescriptor, TargetType,
    to_snake_case,
};
pub use error::{Error, Result};
pub use notify::{
    NotifyPropertyChanged, PropertyChangedEventArgs, PropertyChangedHandlers, SubscriptionId,
};
pub use proxy::{CompiledConstructor, GeneratedType, ProxyObject, SetterOp, SetterProgram};
pub use reflect::{ProxyTarget, Reflect, TypeHandle};
pub use types::{TypeRef, enclosing_path};
pub use value::{Arguments, Value};
