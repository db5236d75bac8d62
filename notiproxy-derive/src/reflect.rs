use crate::attrs::{self, Constructor, FieldOptions};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, Ident, LitStr, Type};

struct Property {
    name: LitStr,
    access: Access,
    ty: Type,
    options: FieldOptions,
}

enum Access {
    Field(Ident),
    Computed(Ident),
}

// derive_reflect
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };
    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Reflect cannot be derived for generic types",
        ));
    }

    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            ident,
            "Reflect can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(Error::new_spanned(
            &data.fields,
            "Reflect can only be derived for structs with named fields",
        ));
    };

    let container = attrs::parse_container(&input.attrs)?;

    let mut properties = Vec::new();
    for field in &named.named {
        let options = attrs::parse_field(&field.attrs)?;
        if options.skip {
            continue;
        }
        let Some(field_ident) = field.ident.clone() else {
            continue;
        };
        let name = options.rename.clone().unwrap_or_else(|| {
            LitStr::new(
                &attrs::to_pascal_case(&field_ident.to_string()),
                field_ident.span(),
            )
        });
        properties.push(Property {
            name,
            access: Access::Field(field_ident),
            ty: field.ty.clone(),
            options,
        });
    }
    for computed in &container.computed {
        properties.push(Property {
            name: computed.name.clone(),
            access: Access::Computed(computed.getter.clone()),
            ty: computed.ty.clone(),
            options: FieldOptions {
                readonly: true,
                depends_on: computed.depends_on.clone(),
                ..FieldOptions::default()
            },
        });
    }

    let type_name = ident.to_string();
    let get_arms = properties.iter().map(|p| get_arm(p, &type_name));
    let set_arms = properties.iter().map(|p| set_arm(p, &type_name));
    let descriptors = properties.iter().map(descriptor);
    let constructors = container.constructors.iter().map(constructor);
    let sealed = container.sealed;

    Ok(quote! {
        impl ::notiproxy::__private::Reflect for #ident {
            fn get_property(
                &self,
                name: &str,
            ) -> ::notiproxy::__private::Result<::notiproxy::__private::Value> {
                #[allow(unused_imports)]
                use ::notiproxy::__private::{Error, Value};

                match name {
                    #(#get_arms)*
                    _ => Err(Error::unknown_property(#type_name, name)),
                }
            }

            fn set_property(
                &mut self,
                name: &str,
                value: ::notiproxy::__private::Value,
            ) -> ::notiproxy::__private::Result<()> {
                use ::notiproxy::__private::Error;

                let _ = &value;
                match name {
                    #(#set_arms)*
                    _ => Err(Error::unknown_property(#type_name, name)),
                }
            }

            fn reflect_type_name(&self) -> &'static str {
                #type_name
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }

        impl ::notiproxy::__private::ProxyTarget for #ident {
            fn target_type() -> ::notiproxy::__private::TargetType {
                ::notiproxy::__private::TargetType::new(
                    #type_name,
                    ::notiproxy::__private::enclosing_path(::std::any::type_name::<Self>()),
                )
                    .sealed(#sealed)
                    #(.property(#descriptors))*
                    #(.constructor(#constructors))*
            }
        }
    })
}

fn get_arm(property: &Property, type_name: &str) -> TokenStream {
    let name = &property.name;
    if property.options.writeonly {
        return quote! {
            #name => Err(Error::write_only(#type_name, name)),
        };
    }
    match &property.access {
        Access::Field(field) => quote! {
            #name => Ok(Value::new(::std::clone::Clone::clone(&self.#field))),
        },
        Access::Computed(getter) => quote! {
            #name => Ok(Value::new(self.#getter())),
        },
    }
}

fn set_arm(property: &Property, type_name: &str) -> TokenStream {
    let name = &property.name;
    match &property.access {
        Access::Field(field) if !property.options.readonly => quote! {
            #name => {
                self.#field = value.take(name)?;
                Ok(())
            }
        },
        _ => quote! {
            #name => Err(Error::read_only(#type_name, name)),
        },
    }
}

fn descriptor(property: &Property) -> TokenStream {
    let name = &property.name;
    let ty = &property.ty;
    let options = &property.options;
    let readable = !options.writeonly;
    let writable = !options.readonly;
    let overridable = options.overridable;
    let sealed = options.sealed;
    let no_proxy = options.no_proxy;
    let depends_on = &options.depends_on;

    quote! {
        ::notiproxy::__private::PropertyDescriptor::new(
            #name,
            ::notiproxy::__private::TypeRef::of::<#ty>(),
        )
        .readable(#readable)
        .writable(#writable)
        .overridable(#overridable)
        .sealed(#sealed)
        .no_proxy(#no_proxy)
        #(.depends_on(#depends_on))*
    }
}

fn constructor(ctor: &Constructor) -> TokenStream {
    match ctor {
        Constructor::Default => quote! {
            ::notiproxy::__private::ConstructorDescriptor::new("default").invoker(|_| {
                Ok(::std::boxed::Box::new(<Self as ::std::default::Default>::default())
                    as ::std::boxed::Box<dyn ::notiproxy::__private::Reflect>)
            })
        },
        Constructor::Function { name, params } => {
            let ctor_name = name.to_string();
            let param_names: Vec<&Ident> = params.iter().map(|p| &p.name).collect();
            let param_strs: Vec<String> = param_names.iter().map(|p| p.to_string()).collect();
            let param_types: Vec<&Type> = params.iter().map(|p| &p.ty).collect();
            if params.is_empty() {
                return quote! {
                    ::notiproxy::__private::ConstructorDescriptor::new(#ctor_name).invoker(|_| {
                        Ok(::std::boxed::Box::new(Self::#name())
                            as ::std::boxed::Box<dyn ::notiproxy::__private::Reflect>)
                    })
                };
            }
            quote! {
                ::notiproxy::__private::ConstructorDescriptor::new(#ctor_name)
                    #(.param::<#param_types>(#param_strs))*
                    .invoker(|args| {
                        let mut args = ::notiproxy::__private::Arguments::new(args);
                        #(let #param_names: #param_types = args.take(#param_strs)?;)*
                        Ok(::std::boxed::Box::new(Self::#name(#(#param_names),*))
                            as ::std::boxed::Box<dyn ::notiproxy::__private::Reflect>)
                    })
            }
        }
    }
}
