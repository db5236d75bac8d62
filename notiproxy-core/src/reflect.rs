//! Reflection traits implemented by proxy targets.

use crate::descriptor::TargetType;
use crate::error::{Error, Result};
use crate::value::Value;
use std::any::{Any, TypeId};
use std::fmt;

/// Dynamic property access on a concrete object.
///
/// Usually implemented with `#[derive(Reflect)]`. Property names are the
/// descriptor names (`Value`), not the Rust field names.
pub trait Reflect: Any + Send + Sync {
    /// Reads a property.
    ///
    /// # Errors
    /// Returns an error if the property is unknown or write-only.
    fn get_property(&self, name: &str) -> Result<Value>;

    /// Replaces a property value.
    ///
    /// # Errors
    /// Returns an error if the property is unknown, read-only or the value
    /// has the wrong type.
    fn set_property(&mut self, name: &str, value: Value) -> Result<()>;

    /// Reads an indexed property.
    ///
    /// # Errors
    /// Returns `Error::NotIndexed` unless overridden.
    fn get_indexed(&self, name: &str, index: Vec<Value>) -> Result<Value> {
        let _ = index;
        Err(Error::not_indexed(self.reflect_type_name(), name))
    }

    /// Replaces an indexed property value.
    ///
    /// # Errors
    /// Returns `Error::NotIndexed` unless overridden.
    fn set_indexed(&mut self, name: &str, index: Vec<Value>, value: Value) -> Result<()> {
        let _ = (index, value);
        Err(Error::not_indexed(self.reflect_type_name(), name))
    }

    /// Returns the type name used in error messages.
    fn reflect_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Upcasts to `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to mutable `Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Upcasts a boxed object to `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A concrete type that can describe itself for proxy generation.
pub trait ProxyTarget: Reflect + Sized {
    /// Returns the reflection descriptor of this type.
    fn target_type() -> TargetType;
}

/// Handle naming a proxy target type in a generation request.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    id: TypeId,
    name: &'static str,
    describe: fn() -> TargetType,
}

impl TypeHandle {
    /// Returns the handle for `T`.
    #[must_use]
    pub fn of<T: ProxyTarget>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            describe: T::target_type,
        }
    }

    /// Returns the `TypeId` of the target.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the Rust type name of the target.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Produces the target's descriptor.
    #[must_use]
    pub fn describe(&self) -> TargetType {
        (self.describe)()
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeHandle {}

impl std::hash::Hash for TypeHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHandle").field(&self.name).finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::descriptor::{ConstructorDescriptor, PropertyDescriptor};
    use crate::types::TypeRef;
    use crate::value::Arguments;

    /// Hand-written target used across the crate's tests.
    #[derive(Debug, Default)]
    pub(crate) struct Counter {
        pub(crate) label: String,
        pub(crate) count: u32,
        pub(crate) slots: Vec<u32>,
    }

    impl Reflect for Counter {
        fn get_property(&self, name: &str) -> Result<Value> {
            match name {
                "Label" => Ok(Value::new(self.label.clone())),
                "Count" => Ok(Value::new(self.count)),
                "Doubled" => Ok(Value::new(self.count * 2)),
                _ => Err(Error::unknown_property("Counter", name)),
            }
        }

        fn set_property(&mut self, name: &str, value: Value) -> Result<()> {
            match name {
                "Label" => self.label = value.take(name)?,
                "Count" => self.count = value.take(name)?,
                "Doubled" => return Err(Error::read_only("Counter", name)),
                _ => return Err(Error::unknown_property("Counter", name)),
            }
            Ok(())
        }

        fn get_indexed(&self, name: &str, index: Vec<Value>) -> Result<Value> {
            if name != "Slot" {
                return Err(Error::not_indexed("Counter", name));
            }
            let i: usize = Arguments::new(index).take("index")?;
            self.slots
                .get(i)
                .map(|v| Value::new(*v))
                .ok_or_else(|| Error::MissingArgument {
                    name: "index".to_string(),
                })
        }

        fn set_indexed(&mut self, name: &str, index: Vec<Value>, value: Value) -> Result<()> {
            if name != "Slot" {
                return Err(Error::not_indexed("Counter", name));
            }
            let i: usize = Arguments::new(index).take("index")?;
            let v: u32 = value.take(name)?;
            if self.slots.len() <= i {
                self.slots.resize(i + 1, 0);
            }
            self.slots[i] = v;
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn Any> {
            self
        }
    }

    impl ProxyTarget for Counter {
        fn target_type() -> TargetType {
            TargetType::new("Counter", module_path!())
                .property(
                    PropertyDescriptor::new("Label", TypeRef::of::<String>()).overridable(true),
                )
                .property(
                    PropertyDescriptor::new("Count", TypeRef::of::<u32>())
                        .overridable(true)
                        .depends_on("Doubled"),
                )
                .property(
                    PropertyDescriptor::new("Doubled", TypeRef::of::<u32>()).writable(false),
                )
                .property(
                    PropertyDescriptor::new("Slot", TypeRef::of::<u32>())
                        .overridable(true)
                        .index(crate::descriptor::ParameterDescriptor::of::<usize>("index")),
                )
                .constructor(ConstructorDescriptor::new("new").invoker(|_| {
                    Ok(Box::new(Counter::default()) as Box<dyn Reflect>)
                }))
                .constructor(
                    ConstructorDescriptor::new("with_label")
                        .param::<String>("label")
                        .invoker(|args| {
                            let mut args = Arguments::new(args);
                            Ok(Box::new(Counter {
                                label: args.take("label")?,
                                ..Counter::default()
                            }) as Box<dyn Reflect>)
                        }),
                )
        }
    }

    #[test]
    fn test_type_handle_identity() {
        let a = TypeHandle::of::<Counter>();
        let b = TypeHandle::of::<Counter>();
        assert_eq!(a, b);
        assert_eq!(a.id(), TypeId::of::<Counter>());
        assert!(a.name().ends_with("Counter"));
        assert_eq!(a.describe().name, "Counter");
    }

    #[test]
    fn test_default_indexed_access_is_rejected() {
        struct Plain;
        impl Reflect for Plain {
            fn get_property(&self, name: &str) -> Result<Value> {
                Err(Error::unknown_property("Plain", name))
            }
            fn set_property(&mut self, name: &str, _value: Value) -> Result<()> {
                Err(Error::unknown_property("Plain", name))
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }
        }

        let mut plain = Plain;
        assert!(matches!(
            plain.get_indexed("X", Vec::new()),
            Err(Error::NotIndexed { .. })
        ));
        assert!(matches!(
            plain.set_indexed("X", Vec::new(), Value::new(1u8)),
            Err(Error::NotIndexed { .. })
        ));
    }

    #[test]
    fn test_counter_round_trip() {
        let mut counter = Counter::default();
        counter
            .set_property("Count", Value::new(4u32))
            .unwrap();
        let doubled = counter.get_property("Doubled").unwrap();
        assert_eq!(doubled.downcast_ref::<u32>(), Some(&8));
        assert!(counter.set_property("Doubled", Value::new(1u32)).is_err());
    }
}
