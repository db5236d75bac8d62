//! `#[reflect(...)]` attribute parsing.

use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Attribute, Ident, LitStr, Token, Type};

/// Options on the struct itself.
#[derive(Default)]
pub struct ContainerOptions {
    pub sealed: bool,
    pub constructors: Vec<Constructor>,
    pub computed: Vec<Computed>,
}

/// Options on one field.
#[derive(Default)]
pub struct FieldOptions {
    pub overridable: bool,
    pub sealed: bool,
    pub readonly: bool,
    pub writeonly: bool,
    pub no_proxy: bool,
    pub skip: bool,
    pub rename: Option<LitStr>,
    pub depends_on: Vec<LitStr>,
}

/// An exposed constructor.
pub enum Constructor {
    /// `Default::default`.
    Default,
    /// An associated function returning `Self`.
    Function { name: Ident, params: Vec<Param> },
}

/// `name: Type` inside `constructor(new(...))`.
pub struct Param {
    pub name: Ident,
    pub ty: Type,
}

impl Parse for Param {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let name = input.parse()?;
        input.parse::<Token![:]>()?;
        let ty = input.parse()?;
        Ok(Self { name, ty })
    }
}

/// A read-only property backed by a method.
pub struct Computed {
    pub name: LitStr,
    pub ty: Type,
    pub getter: Ident,
    pub depends_on: Vec<LitStr>,
}

fn reflect_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|a| a.path().is_ident("reflect"))
}

pub fn parse_container(attrs: &[Attribute]) -> syn::Result<ContainerOptions> {
    let mut options = ContainerOptions::default();
    for attr in reflect_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("sealed") {
                options.sealed = true;
                Ok(())
            } else if meta.path.is_ident("constructor") {
                meta.parse_nested_meta(|ctor| {
                    let Some(name) = ctor.path.get_ident().cloned() else {
                        return Err(ctor.error("expected a constructor name"));
                    };
                    if name == "default" && !ctor.input.peek(syn::token::Paren) {
                        options.constructors.push(Constructor::Default);
                        return Ok(());
                    }
                    let content;
                    syn::parenthesized!(content in ctor.input);
                    let params = Punctuated::<Param, Token![,]>::parse_terminated(&content)?;
                    options.constructors.push(Constructor::Function {
                        name,
                        params: params.into_iter().collect(),
                    });
                    Ok(())
                })
            } else if meta.path.is_ident("computed") {
                let mut name = None;
                let mut ty = None;
                let mut getter = None;
                let mut depends_on = Vec::new();
                meta.parse_nested_meta(|item| {
                    if item.path.is_ident("name") {
                        name = Some(item.value()?.parse::<LitStr>()?);
                    } else if item.path.is_ident("ty") {
                        ty = Some(item.value()?.parse::<Type>()?);
                    } else if item.path.is_ident("getter") {
                        getter = Some(item.value()?.parse::<Ident>()?);
                    } else if item.path.is_ident("depends_on") {
                        depends_on.push(item.value()?.parse::<LitStr>()?);
                    } else {
                        return Err(item.error("unsupported computed option"));
                    }
                    Ok(())
                })?;
                let (Some(name), Some(ty), Some(getter)) = (name, ty, getter) else {
                    return Err(meta.error("computed properties need `name`, `ty` and `getter`"));
                };
                options.computed.push(Computed {
                    name,
                    ty,
                    getter,
                    depends_on,
                });
                Ok(())
            } else {
                Err(meta.error("unsupported reflect option"))
            }
        })?;
    }
    Ok(options)
}

pub fn parse_field(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in reflect_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("overridable") {
                options.overridable = true;
            } else if meta.path.is_ident("sealed") {
                options.sealed = true;
            } else if meta.path.is_ident("readonly") {
                options.readonly = true;
            } else if meta.path.is_ident("writeonly") {
                options.writeonly = true;
            } else if meta.path.is_ident("no_proxy") {
                options.no_proxy = true;
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("rename") {
                options.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("depends_on") {
                options.depends_on.push(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unsupported reflect option"));
            }
            Ok(())
        })?;
    }
    if options.readonly && options.writeonly {
        if let Some(attr) = reflect_attrs(attrs).next() {
            return Err(syn::Error::new_spanned(
                attr,
                "a property cannot be both readonly and writeonly",
            ));
        }
    }
    Ok(options)
}

/// Converts a field name to a property name: `dependant_on_value` to
/// `DependantOnValue`.
pub fn to_pascal_case(s: &str) -> String {
    let s = s.strip_prefix("r#").unwrap_or(s);
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("should_not_be_proxied"), "ShouldNotBeProxied");
        assert_eq!(to_pascal_case("value"), "Value");
    }

    #[test]
    fn test_to_pascal_case_raw_identifier() {
        assert_eq!(to_pascal_case("r#type"), "Type");
        assert_eq!(to_pascal_case("r#match_arm"), "MatchArm");
    }
}
