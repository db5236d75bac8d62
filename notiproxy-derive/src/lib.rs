//! # notiproxy Derive
//!
//! Procedural macros for proxy targets.
//!
//! `#[derive(Reflect)]` implements `Reflect` and `ProxyTarget` for a struct
//! with named fields, so the type can be handed to the proxy factory.

use proc_macro::TokenStream;

mod attrs;
mod reflect;

/// Derives `Reflect` and `ProxyTarget` for a struct.
///
/// Each named field becomes a property named after the field in
/// PascalCase. Readable fields must implement `Clone`.
///
/// Field attributes:
/// - `#[reflect(overridable)]` allows the proxy to intercept the property
/// - `#[reflect(sealed)]` forbids interception
/// - `#[reflect(readonly)]` / `#[reflect(writeonly)]`
/// - `#[reflect(no_proxy)]` opts the property out of notifications
/// - `#[reflect(depends_on = "Other")]` announces `Other` after this one
/// - `#[reflect(rename = "Name")]` overrides the property name
/// - `#[reflect(skip)]` hides the field
///
/// Container attributes:
/// - `#[reflect(sealed)]` marks the type as not proxyable
/// - `#[reflect(constructor(new(value: String)))]` exposes `Self::new`
/// - `#[reflect(constructor(default))]` exposes `Default::default`
/// - `#[reflect(computed(name = "Total", ty = u64, getter = total))]` adds a
///   read-only property backed by a method
///
/// # Example
/// ```ignore
/// #[derive(Default, Reflect)]
/// #[reflect(constructor(new(value: String)))]
/// struct Poco {
///     #[reflect(overridable, depends_on = "DependantOnValue")]
///     value: String,
///     #[reflect(overridable, no_proxy)]
///     should_not_be_proxied: String,
///     #[reflect(readonly)]
///     dependant_on_value: String,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    reflect::derive_reflect(input.into()).into()
}
