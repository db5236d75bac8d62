//! Dynamically typed values passed through reflection.

use crate::error::{Error, Result};
use std::any::{Any, TypeId};
use std::fmt;

/// A type-erased, owned value.
///
/// Values carry the `std::any::type_name` of what they hold so that
/// mismatches can be reported without knowing the concrete type.
pub struct Value {
    inner: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wraps a value.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the `TypeId` of the wrapped value.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        Any::type_id(&*self.inner)
    }

    /// Returns the type name of the wrapped value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrows the wrapped value as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Unwraps the value as `T`, returning the original value on mismatch.
    ///
    /// # Errors
    /// Returns `self` unchanged if the value is not a `T`.
    pub fn downcast<T: Any>(self) -> std::result::Result<T, Self> {
        let type_name = self.type_name;
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self { inner, type_name }),
        }
    }

    /// Unwraps the value as `T`, reporting `context` on mismatch.
    ///
    /// # Errors
    /// Returns `Error::TypeMismatch` if the value is not a `T`.
    pub fn take<T: Any>(self, context: &str) -> Result<T> {
        self.downcast::<T>().map_err(|value| {
            Error::type_mismatch(context, std::any::type_name::<T>(), value.type_name())
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Sequential reader over constructor arguments.
///
/// Used by constructor invokers to pull typed parameters in declaration order.
#[derive(Debug)]
pub struct Arguments {
    values: std::vec::IntoIter<Value>,
}

impl Arguments {
    /// Creates a reader over the given values.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    /// Takes the next argument as `T`.
    ///
    /// # Errors
    /// Returns `Error::MissingArgument` when exhausted and
    /// `Error::TypeMismatch` when the next value is not a `T`.
    pub fn take<T: Any>(&mut self, name: &str) -> Result<T> {
        let value = self.values.next().ok_or_else(|| Error::MissingArgument {
            name: name.to_string(),
        })?;
        value.take(name)
    }

    /// Returns the number of arguments not yet taken.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// Builds a `Vec<Value>` from a list of expressions.
///
/// ```
/// use notiproxy_core::args;
///
/// let args = args![String::from("x"), 42u32];
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::Value::new($arg)),+]
    };
}
