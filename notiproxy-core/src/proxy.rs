//! Executable proxy types.
//!
//! A `GeneratedType` is what the compiler backend produces from one proxy
//! declaration: the constructors it forwards and, per intercepted property,
//! the program its mutator runs. `ProxyObject` is an instance of it wrapping
//! a boxed base object.

use crate::descriptor::{Invoker, ParameterDescriptor, TargetType};
use crate::error::{Error, Result};
use crate::notify::{NotifyPropertyChanged, PropertyChangedEventArgs, PropertyChangedHandlers};
use crate::reflect::{ProxyTarget, Reflect};
use crate::value::Value;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// One step of an intercepted mutator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetterOp {
    /// Store the incoming value through the base mutator.
    Store,
    /// Raise a change notification for the named property.
    Notify(String),
}

/// Compiled body of an intercepted mutator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetterProgram {
    /// Intercepted property.
    pub property: String,
    /// Whether the mutator takes index arguments.
    pub indexed: bool,
    /// Steps in execution order.
    pub ops: Vec<SetterOp>,
}

impl SetterProgram {
    /// Returns the property names this mutator announces, in order.
    pub fn notifications(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            SetterOp::Notify(name) => Some(name.as_str()),
            SetterOp::Store => None,
        })
    }
}

/// A pass-through constructor of a generated type.
#[derive(Clone)]
pub struct CompiledConstructor {
    /// Base constructor name.
    pub name: String,
    /// Parameters, identical to the base constructor's.
    pub params: Vec<ParameterDescriptor>,
    /// Base constructor entry point.
    pub invoker: Option<Invoker>,
}

impl CompiledConstructor {
    fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len() && self.params.iter().zip(args).all(|(p, a)| p.accepts(a))
    }

    fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

impl fmt::Debug for CompiledConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledConstructor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("linked", &self.invoker.is_some())
            .finish()
    }
}

/// A compiled proxy type.
#[derive(Debug)]
pub struct GeneratedType {
    name: String,
    base: Arc<TargetType>,
    constructors: Vec<CompiledConstructor>,
    setters: Vec<SetterProgram>,
}

impl GeneratedType {
    /// Creates a generated type with no members.
    #[must_use]
    pub fn new(name: impl Into<String>, base: Arc<TargetType>) -> Self {
        Self {
            name: name.into(),
            base,
            constructors: Vec::new(),
            setters: Vec::new(),
        }
    }

    /// Adds a constructor.
    pub fn add_constructor(&mut self, constructor: CompiledConstructor) {
        self.constructors.push(constructor);
    }

    /// Adds an intercepted mutator.
    pub fn add_setter(&mut self, setter: SetterProgram) {
        self.setters.push(setter);
    }

    /// Returns the generated type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the proxied type's descriptor.
    #[must_use]
    pub fn base(&self) -> &Arc<TargetType> {
        &self.base
    }

    /// Returns the constructors in declaration order.
    #[must_use]
    pub fn constructors(&self) -> &[CompiledConstructor] {
        &self.constructors
    }

    /// Returns the intercepted mutators in declaration order.
    #[must_use]
    pub fn setters(&self) -> &[SetterProgram] {
        &self.setters
    }

    /// Looks up the intercepted mutator of a property.
    #[must_use]
    pub fn setter(&self, property: &str) -> Option<&SetterProgram> {
        self.setters.iter().find(|s| s.property == property)
    }

    /// Returns true if setting `property` raises notifications.
    #[must_use]
    pub fn intercepts(&self, property: &str) -> bool {
        self.setter(property).is_some()
    }

    /// Constructs an instance, forwarding `args` to the first constructor
    /// whose parameter list matches them in arity and type.
    ///
    /// # Errors
    /// Returns `Error::ConstructionMismatch` if no constructor matches,
    /// `Error::ConstructorNotLinked` if the match has no runtime entry point,
    /// or whatever the base constructor returns.
    pub fn instantiate(self: &Arc<Self>, args: Vec<Value>) -> Result<ProxyObject> {
        let Some(ctor) = self.constructors.iter().find(|c| c.accepts(&args)) else {
            let arguments: Vec<&str> = args.iter().map(Value::type_name).collect();
            let candidates: Vec<String> =
                self.constructors.iter().map(CompiledConstructor::signature).collect();
            return Err(Error::ConstructionMismatch {
                type_name: self.base.qualified_name(),
                arguments: arguments.join(", "),
                candidates: candidates.join("; "),
            });
        };
        let invoker = ctor
            .invoker
            .as_ref()
            .ok_or_else(|| Error::ConstructorNotLinked {
                type_name: self.base.qualified_name(),
                constructor: ctor.name.clone(),
            })?;
        let base = invoker(args)?;
        Ok(ProxyObject {
            ty: Arc::clone(self),
            base,
            property_changed: PropertyChangedHandlers::new(),
        })
    }
}

/// An instance of a generated type.
///
/// Reads are delegated to the base object (also through `Deref`); writes
/// to intercepted properties run the compiled mutator, all other writes are
/// forwarded without notification.
pub struct ProxyObject<B: ?Sized + Reflect = dyn Reflect> {
    ty: Arc<GeneratedType>,
    base: Box<B>,
    property_changed: PropertyChangedHandlers,
}

impl<B: ?Sized + Reflect> ProxyObject<B> {
    /// Returns the generated type of this instance.
    #[must_use]
    pub fn generated_type(&self) -> &Arc<GeneratedType> {
        &self.ty
    }

    /// Borrows the base object.
    #[must_use]
    pub fn base(&self) -> &B {
        &self.base
    }

    /// Releases the base object, dropping all listeners.
    #[must_use]
    pub fn into_base(self) -> Box<B> {
        self.base
    }

    /// Reads a property from the base object.
    ///
    /// # Errors
    /// Propagates the base object's error.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.base.get_property(name)
    }

    /// Reads an indexed property from the base object.
    ///
    /// # Errors
    /// Propagates the base object's error.
    pub fn get_indexed(&self, name: &str, index: Vec<Value>) -> Result<Value> {
        self.base.get_indexed(name, index)
    }

    /// Writes a property.
    ///
    /// # Errors
    /// Propagates the base object's error; no notification is raised when
    /// the store fails.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let ty = Arc::clone(&self.ty);
        match ty.setter(name).filter(|s| !s.indexed) {
            Some(program) => self.run(program, None, value),
            None => self.base.set_property(name, value),
        }
    }

    /// Writes an indexed property.
    ///
    /// # Errors
    /// Propagates the base object's error.
    pub fn set_indexed(&mut self, name: &str, index: Vec<Value>, value: Value) -> Result<()> {
        let ty = Arc::clone(&self.ty);
        match ty.setter(name).filter(|s| s.indexed) {
            Some(program) => self.run(program, Some(index), value),
            None => self.base.set_indexed(name, index, value),
        }
    }

    fn run(&mut self, program: &SetterProgram, index: Option<Vec<Value>>, value: Value) -> Result<()> {
        let mut pending = Some((index, value));
        for op in &program.ops {
            match op {
                SetterOp::Store => {
                    if let Some((index, value)) = pending.take() {
                        match index {
                            Some(index) => {
                                self.base.set_indexed(&program.property, index, value)?;
                            }
                            None => self.base.set_property(&program.property, value)?,
                        }
                    }
                }
                SetterOp::Notify(name) => self.on_property_changed(name),
            }
        }
        Ok(())
    }

    fn on_property_changed(&self, property_name: &str) {
        if self.property_changed.is_empty() {
            return;
        }
        self.property_changed
            .raise(&PropertyChangedEventArgs::new(property_name));
    }
}

impl ProxyObject {
    /// Converts into a proxy whose base is statically typed.
    ///
    /// # Errors
    /// Returns `Error::TypeMismatch` if the base object is not a `T`.
    pub fn downcast<T: ProxyTarget>(self) -> Result<ProxyObject<T>> {
        let actual = self.base.reflect_type_name();
        let Self {
            ty,
            base,
            property_changed,
        } = self;
        let base = base
            .into_any()
            .downcast::<T>()
            .map_err(|_| Error::type_mismatch(ty.name(), std::any::type_name::<T>(), actual))?;
        Ok(ProxyObject {
            ty,
            base,
            property_changed,
        })
    }
}

impl<B: ?Sized + Reflect> Deref for ProxyObject<B> {
    type Target = B;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<B: ?Sized + Reflect> NotifyPropertyChanged for ProxyObject<B> {
    fn property_changed(&self) -> &PropertyChangedHandlers {
        &self.property_changed
    }
}

impl<B: ?Sized + Reflect> fmt::Debug for ProxyObject<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyObject")
            .field("type", &self.ty.name())
            .field("base", &self.ty.base().qualified_name())
            .field("property_changed", &self.property_changed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::reflect::tests::Counter;
    use parking_lot::Mutex;

    fn counter_proxy_type() -> Arc<GeneratedType> {
        let base = Arc::new(Counter::target_type());
        let mut ty = GeneratedType::new("NotifyingCounter", Arc::clone(&base));
        for ctor in &base.constructors {
            ty.add_constructor(CompiledConstructor {
                name: ctor.name.clone(),
                params: ctor.params.clone(),
                invoker: ctor.invoker.clone(),
            });
        }
        ty.add_setter(SetterProgram {
            property: "Count".to_string(),
            indexed: false,
            ops: vec![
                SetterOp::Store,
                SetterOp::Notify("Count".to_string()),
                SetterOp::Notify("Doubled".to_string()),
            ],
        });
        ty.add_setter(SetterProgram {
            property: "Slot".to_string(),
            indexed: true,
            ops: vec![SetterOp::Store, SetterOp::Notify("Slot".to_string())],
        });
        Arc::new(ty)
    }

    fn record<B: ?Sized + Reflect>(proxy: &ProxyObject<B>) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        proxy.subscribe(move |e| sink.lock().push(e.property_name().to_string()));
        seen
    }

    #[test]
    fn test_instantiate_selects_constructor_by_arguments() {
        let ty = counter_proxy_type();
        let proxy = ty.instantiate(args![String::from("hits")]).unwrap();
        let label = proxy.get("Label").unwrap();
        assert_eq!(label.downcast_ref::<String>().map(String::as_str), Some("hits"));

        let proxy = ty.instantiate(args![]).unwrap();
        assert_eq!(proxy.get("Count").unwrap().downcast_ref::<u32>(), Some(&0));
    }

    #[test]
    fn test_instantiate_mismatch() {
        let ty = counter_proxy_type();
        let err = ty.instantiate(args![1u8, 2u8]).unwrap_err();
        match err {
            Error::ConstructionMismatch { candidates, .. } => {
                assert!(candidates.contains("with_label(label: std::string::String)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unlinked_constructor() {
        let base = Arc::new(TargetType::new("Ghost", "demo"));
        let mut ty = GeneratedType::new("NotifyingGhost", base);
        ty.add_constructor(CompiledConstructor {
            name: "new".to_string(),
            params: Vec::new(),
            invoker: None,
        });
        let err = Arc::new(ty).instantiate(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::ConstructorNotLinked { .. }));
    }

    #[test]
    fn test_intercepted_set_notifies_in_order() {
        let ty = counter_proxy_type();
        let mut proxy = ty.instantiate(args![]).unwrap();
        let seen = record(&proxy);

        proxy.set("Count", Value::new(3u32)).unwrap();
        assert_eq!(*seen.lock(), vec!["Count", "Doubled"]);
        assert_eq!(proxy.get("Doubled").unwrap().downcast_ref::<u32>(), Some(&6));
    }

    #[test]
    fn test_plain_set_is_silent() {
        let ty = counter_proxy_type();
        let mut proxy = ty.instantiate(args![]).unwrap();
        let seen = record(&proxy);

        proxy.set("Label", Value::new(String::from("x"))).unwrap();
        assert!(seen.lock().is_empty());
        assert_eq!(
            proxy.get("Label").unwrap().downcast_ref::<String>().map(String::as_str),
            Some("x")
        );
    }

    #[test]
    fn test_failed_store_raises_nothing() {
        let ty = counter_proxy_type();
        let mut proxy = ty.instantiate(args![]).unwrap();
        let seen = record(&proxy);

        let err = proxy.set("Count", Value::new("wrong")).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_indexed_set() {
        let ty = counter_proxy_type();
        let mut proxy = ty.instantiate(args![]).unwrap();
        let seen = record(&proxy);

        proxy
            .set_indexed("Slot", args![2usize], Value::new(9u32))
            .unwrap();
        assert_eq!(*seen.lock(), vec!["Slot"]);
        let slot = proxy.get_indexed("Slot", args![2usize]).unwrap();
        assert_eq!(slot.downcast_ref::<u32>(), Some(&9));
    }

    #[test]
    fn test_downcast_to_typed_proxy() {
        let ty = counter_proxy_type();
        let proxy = ty.instantiate(args![String::from("typed")]).unwrap();
        let mut typed = proxy.downcast::<Counter>().unwrap();
        assert_eq!(typed.label, "typed");

        let seen = record(&typed);
        typed.set("Count", Value::new(1u32)).unwrap();
        assert_eq!(typed.count, 1);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_setter_program_notifications() {
        let ty = counter_proxy_type();
        let names: Vec<&str> = ty.setter("Count").unwrap().notifications().collect();
        assert_eq!(names, vec!["Count", "Doubled"]);
        assert!(ty.intercepts("Slot"));
        assert!(!ty.intercepts("Label"));
    }
}
