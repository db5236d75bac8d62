//! Type, property and constructor descriptors.
//!
//! Descriptors are the read-only reflection data the generator works from.
//! They are produced by `#[derive(Reflect)]`, by hand through the builder
//! methods below, or by parsing a type manifest.

use crate::error::Result;
use crate::reflect::Reflect;
use crate::types::TypeRef;
use crate::value::Value;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Runtime constructor entry point.
pub type Invoker = Arc<dyn Fn(Vec<Value>) -> Result<Box<dyn Reflect>> + Send + Sync>;

/// Description of a type that may be proxied.
#[derive(Debug, Clone)]
pub struct TargetType {
    /// Bare type name.
    pub name: String,
    /// Path of the enclosing module or function.
    pub module_path: String,
    /// Whether the type refuses to be proxied.
    pub sealed: bool,
    /// Declared properties in declaration order.
    pub properties: Vec<PropertyDescriptor>,
    /// Declared constructors in declaration order.
    pub constructors: Vec<ConstructorDescriptor>,
}

impl TargetType {
    /// Creates an unsealed type with no members.
    #[must_use]
    pub fn new(name: impl Into<String>, module_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_path: module_path.into(),
            sealed: false,
            properties: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Marks the type as sealed.
    #[must_use]
    pub fn sealed(mut self, sealed: bool) -> Self {
        self.sealed = sealed;
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a constructor.
    #[must_use]
    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Returns `module_path::name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.module_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.module_path, self.name)
        }
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Looks up a property by its mutator method name.
    #[must_use]
    pub fn find_setter(&self, setter: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| p.writable && p.setter == setter)
    }

    /// Looks up a constructor by name.
    #[must_use]
    pub fn find_constructor(&self, name: &str) -> Option<&ConstructorDescriptor> {
        self.constructors.iter().find(|c| c.name == name)
    }
}

/// Description of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Property name, e.g. `Value`.
    pub name: String,
    /// Declared value type.
    pub value_type: TypeRef,
    /// Index parameters of an indexed property.
    pub index: Vec<ParameterDescriptor>,
    /// Has an accessor.
    pub readable: bool,
    /// Has a mutator.
    pub writable: bool,
    /// Accessor and mutator may be intercepted.
    pub overridable: bool,
    /// Interception is forbidden below this point.
    pub sealed: bool,
    /// Opt-out marker.
    pub no_proxy: bool,
    /// Properties announced together with this one, in declaration order.
    pub depends_on: Vec<String>,
    /// Accessor method name.
    pub getter: String,
    /// Mutator method name.
    pub setter: String,
}

impl PropertyDescriptor {
    /// Creates a read-write, non-overridable property.
    ///
    /// Accessor names default to `snake_case(name)` and `set_snake_case(name)`.
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: TypeRef) -> Self {
        let name = name.into();
        let getter = to_snake_case(&name);
        let setter = format!("set_{getter}");
        Self {
            name,
            value_type,
            index: Vec::new(),
            readable: true,
            writable: true,
            overridable: false,
            sealed: false,
            no_proxy: false,
            depends_on: Vec::new(),
            getter,
            setter,
        }
    }

    /// Sets whether the property has an accessor.
    #[must_use]
    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    /// Sets whether the property has a mutator.
    #[must_use]
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Sets whether accessor and mutator may be intercepted.
    #[must_use]
    pub fn overridable(mut self, overridable: bool) -> Self {
        self.overridable = overridable;
        self
    }

    /// Seals the property against interception.
    #[must_use]
    pub fn sealed(mut self, sealed: bool) -> Self {
        self.sealed = sealed;
        self
    }

    /// Attaches the opt-out marker.
    #[must_use]
    pub fn no_proxy(mut self, no_proxy: bool) -> Self {
        self.no_proxy = no_proxy;
        self
    }

    /// Attaches a dependency marker.
    #[must_use]
    pub fn depends_on(mut self, property: impl Into<String>) -> Self {
        self.depends_on.push(property.into());
        self
    }

    /// Adds an index parameter.
    #[must_use]
    pub fn index(mut self, parameter: ParameterDescriptor) -> Self {
        self.index.push(parameter);
        self
    }

    /// Overrides the accessor method name.
    #[must_use]
    pub fn getter(mut self, getter: impl Into<String>) -> Self {
        self.getter = getter.into();
        self
    }

    /// Overrides the mutator method name.
    #[must_use]
    pub fn setter(mut self, setter: impl Into<String>) -> Self {
        self.setter = setter.into();
        self
    }

    /// Returns true if the property takes index parameters.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.index.is_empty()
    }

    /// Returns why the property cannot be proxied, or `None` if it can.
    #[must_use]
    pub fn ineligibility(&self) -> Option<&'static str> {
        if !self.readable {
            Some("not readable")
        } else if !self.writable {
            Some("not writable")
        } else if !self.overridable {
            Some("not overridable")
        } else if self.sealed {
            Some("sealed")
        } else if self.no_proxy {
            Some("opted out")
        } else {
            None
        }
    }

    /// Returns true if the property is readable, writable, overridable,
    /// not sealed and not opted out.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.ineligibility().is_none()
    }
}

/// Description of one constructor or index parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: TypeRef,
    /// Exact runtime type, when known.
    pub type_id: Option<TypeId>,
}

impl ParameterDescriptor {
    /// Creates a parameter of the Rust type `T`.
    #[must_use]
    pub fn of<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeRef::of::<T>(),
            type_id: Some(TypeId::of::<T>()),
        }
    }

    /// Creates a parameter from a type reference only.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            type_id: None,
        }
    }

    /// Returns true if `value` can be passed for this parameter.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self.type_id {
            Some(id) => value.type_id() == id,
            None => TypeRef::parse(value.type_name()).is_ok_and(|ty| ty == self.ty),
        }
    }
}

/// Description of one constructor.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    /// Constructor function name, e.g. `new`.
    pub name: String,
    /// Ordered parameters.
    pub params: Vec<ParameterDescriptor>,
    /// Runtime entry point, absent for manifest-described types.
    pub invoker: Option<Invoker>,
}

impl ConstructorDescriptor {
    /// Creates a constructor with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            invoker: None,
        }
    }

    /// Adds a parameter of the Rust type `T`.
    #[must_use]
    pub fn param<T: 'static>(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParameterDescriptor::of::<T>(name));
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParameterDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// Attaches the runtime entry point.
    #[must_use]
    pub fn invoker<F>(mut self, invoker: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Box<dyn Reflect>> + Send + Sync + 'static,
    {
        self.invoker = Some(Arc::new(invoker));
        self
    }

    /// Returns true if `args` match the parameter list in arity and type.
    #[must_use]
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(p, a)| p.accepts(a))
    }

    /// Renders `name(a: A, b: B)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("linked", &self.invoker.is_some())
            .finish()
    }
}

/// Converts a string to snake_case.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            result.push('_');
        }
        result.push(c.to_ascii_lowercase());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poco() -> TargetType {
        TargetType::new("Poco", "demo::model")
            .property(
                PropertyDescriptor::new("Value", TypeRef::of::<String>())
                    .overridable(true)
                    .depends_on("DependantOnValue"),
            )
            .property(
                PropertyDescriptor::new("DependantOnValue", TypeRef::of::<String>())
                    .writable(false),
            )
            .constructor(ConstructorDescriptor::new("new").param::<String>("value"))
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(poco().qualified_name(), "demo::model::Poco");
        assert_eq!(TargetType::new("Root", "").qualified_name(), "Root");
    }

    #[test]
    fn test_default_accessor_names() {
        let prop = PropertyDescriptor::new("DependantOnValue", TypeRef::of::<u8>());
        assert_eq!(prop.getter, "dependant_on_value");
        assert_eq!(prop.setter, "set_dependant_on_value");
    }

    #[test]
    fn test_eligibility_conditions() {
        let base = PropertyDescriptor::new("A", TypeRef::of::<u8>()).overridable(true);
        assert!(base.is_eligible());
        assert_eq!(base.clone().readable(false).ineligibility(), Some("not readable"));
        assert_eq!(base.clone().writable(false).ineligibility(), Some("not writable"));
        assert_eq!(base.clone().overridable(false).ineligibility(), Some("not overridable"));
        assert_eq!(base.clone().sealed(true).ineligibility(), Some("sealed"));
        assert_eq!(base.no_proxy(true).ineligibility(), Some("opted out"));
    }

    #[test]
    fn test_find_members() {
        let ty = poco();
        assert!(ty.find_property("Value").is_some());
        assert_eq!(ty.find_setter("set_value").map(|p| p.name.as_str()), Some("Value"));
        assert!(ty.find_setter("set_dependant_on_value").is_none());
        assert!(ty.find_constructor("new").is_some());
    }

    #[test]
    fn test_constructor_accepts_by_type_id() {
        let ctor = ConstructorDescriptor::new("new")
            .param::<String>("value")
            .param::<u32>("count");
        assert!(ctor.accepts(&[Value::new(String::new()), Value::new(1u32)]));
        assert!(!ctor.accepts(&[Value::new(String::new())]));
        assert!(!ctor.accepts(&[Value::new(String::new()), Value::new(1u64)]));
        assert_eq!(ctor.signature(), "new(value: std::string::String, count: u32)");
    }

    #[test]
    fn test_parameter_accepts_by_type_name() {
        let param = ParameterDescriptor::new("value", TypeRef::path("std::string::String"));
        assert!(param.accepts(&Value::new(String::from("x"))));
        assert!(!param.accepts(&Value::new(1u8)));
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("ShouldNotBeProxied"), "should_not_be_proxied");
    }
}
