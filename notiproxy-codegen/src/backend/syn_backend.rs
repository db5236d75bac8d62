//! In-memory backend built on `syn`.
//!
//! The unit is parsed, its imports and types are resolved against the
//! reference set, and every proxy struct is lowered into a `GeneratedType`:
//! constructors become links to base constructors and intercepted setters
//! become `SetterProgram`s. Nothing is written to disk.

use super::{CompilerBackend, Diagnostic, Diagnostics, ReferenceSet};
use notiproxy_core::{
    CompiledConstructor, GeneratedType, PropertyDescriptor, SetterOp, SetterProgram, TargetType,
};
use proc_macro2::Span;
use quote::ToTokens;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use syn::spanned::Spanned;
use syn::{
    Expr, ExprLit, Fields, FnArg, ImplItem, ImplItemFn, Item, ItemImpl, ItemStruct, Lit, Member,
    Pat, ReturnType, Stmt, Type, UseTree,
};

const BASE_FIELD: &str = "base";
const EVENT_SLOT_TYPE: &str = "PropertyChangedHandlers";
const NOTIFY_TRAIT: &str = "NotifyPropertyChanged";

/// Backend that checks and lowers proxy source with `syn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynBackend;

impl SynBackend {
    /// Creates the backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CompilerBackend for SynBackend {
    fn compile(
        &self,
        source: &str,
        references: &ReferenceSet,
    ) -> Result<Vec<GeneratedType>, Diagnostics> {
        let file = match syn::parse_file(source) {
            Ok(file) => file,
            Err(err) => {
                let diagnostics = err
                    .into_iter()
                    .map(|e| Diagnostic::at(e.span(), e.to_string()))
                    .collect();
                return Err(report(diagnostics));
            }
        };

        let mut unit = Unit::new(references);
        unit.collect(&file.items);
        let types = unit.lower();

        if unit.diagnostics.is_empty() {
            Ok(types)
        } else {
            Err(report(unit.diagnostics))
        }
    }
}

fn report(diagnostics: Diagnostics) -> Diagnostics {
    if cfg!(debug_assertions) {
        for diagnostic in diagnostics.iter() {
            tracing::debug!("{}", diagnostic);
        }
    }
    diagnostics
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiverKind {
    Static,
    Shared,
    Mutable,
    Owned,
}

/// Everything collected from one parsed unit.
struct Unit<'a> {
    references: &'a ReferenceSet,
    globs: Vec<String>,
    named: HashMap<String, String>,
    structs: Vec<&'a ItemStruct>,
    inherent: HashMap<String, Vec<&'a ItemImpl>>,
    notify_impls: HashSet<String>,
    diagnostics: Diagnostics,
}

impl<'a> Unit<'a> {
    fn new(references: &'a ReferenceSet) -> Self {
        Self {
            references,
            globs: Vec::new(),
            named: HashMap::new(),
            structs: Vec::new(),
            inherent: HashMap::new(),
            notify_impls: HashSet::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::at(span, message));
    }

    fn collect(&mut self, items: &'a [Item]) {
        for item in items {
            match item {
                Item::Use(item) => self.collect_use(&item.tree, Vec::new()),
                Item::Struct(item) => self.structs.push(item),
                Item::Impl(item) => self.collect_impl(item),
                Item::Mod(item) => {
                    if let Some((_, content)) = &item.content {
                        self.collect(content);
                    }
                }
                _ => {}
            }
        }
    }

    fn root_known(&self, root: &str) -> bool {
        matches!(root, "crate" | "self" | "super") || self.references.has_crate(root)
    }

    fn collect_use(&mut self, tree: &UseTree, mut prefix: Vec<String>) {
        match tree {
            UseTree::Path(path) => {
                let ident = path.ident.to_string();
                if prefix.is_empty() && !self.root_known(&ident) {
                    self.error(
                        path.ident.span(),
                        format!("unresolved import `{ident}`: no crate named `{ident}` is referenced"),
                    );
                    return;
                }
                prefix.push(ident);
                self.collect_use(&path.tree, prefix);
            }
            UseTree::Name(name) => {
                let ident = name.ident.to_string();
                if prefix.is_empty() && !self.root_known(&ident) {
                    self.error(name.ident.span(), format!("unresolved import `{ident}`"));
                    return;
                }
                prefix.push(ident.clone());
                self.named.insert(ident, prefix.join("::"));
            }
            UseTree::Rename(rename) => {
                prefix.push(rename.ident.to_string());
                self.named
                    .insert(rename.rename.to_string(), prefix.join("::"));
            }
            UseTree::Glob(_) => {
                if !prefix.is_empty() {
                    self.globs.push(prefix.join("::"));
                }
            }
            UseTree::Group(group) => {
                for item in &group.items {
                    self.collect_use(item, prefix.clone());
                }
            }
        }
    }

    fn collect_impl(&mut self, item: &'a ItemImpl) {
        let Some(name) = self_type_name(&item.self_ty) else {
            return;
        };
        match &item.trait_ {
            Some((_, path, _)) => {
                if path.segments.last().is_some_and(|s| s.ident == NOTIFY_TRAIT) {
                    self.notify_impls.insert(name);
                }
            }
            None => self.inherent.entry(name).or_default().push(item),
        }
    }

    fn resolve_path(&self, segments: &[String]) -> Option<Arc<TargetType>> {
        let references = self.references;
        match segments {
            [] => None,
            [single] => {
                if let Some(full) = self.named.get(single) {
                    return references.lookup(full).cloned();
                }
                self.globs
                    .iter()
                    .find_map(|ns| references.lookup(&format!("{ns}::{single}")))
                    .cloned()
            }
            [first, rest @ ..] => {
                let head = self.named.get(first).unwrap_or(first);
                references
                    .lookup(&format!("{head}::{}", rest.join("::")))
                    .cloned()
            }
        }
    }

    fn resolve_type(&self, ty: &Type) -> Option<Arc<TargetType>> {
        match ty {
            Type::Path(path) if path.qself.is_none() => {
                self.resolve_path(&path_segments(&path.path))
            }
            _ => None,
        }
    }

    /// Lowers every proxy struct in source order.
    fn lower(&mut self) -> Vec<GeneratedType> {
        let mut seen = HashSet::new();
        let mut types = Vec::new();
        for item in self.structs.clone() {
            let name = item.ident.to_string();
            if !seen.insert(name.clone()) {
                self.error(
                    item.ident.span(),
                    format!("the name `{name}` is defined multiple times"),
                );
                continue;
            }
            if let Some(ty) = self.lower_struct(item) {
                types.push(ty);
            }
        }
        types
    }

    fn lower_struct(&mut self, item: &'a ItemStruct) -> Option<GeneratedType> {
        let name = item.ident.to_string();
        let Fields::Named(fields) = &item.fields else {
            self.error(
                item.ident.span(),
                format!("proxy `{name}` must have named fields"),
            );
            return None;
        };

        let mut has_base = false;
        let mut base = None;
        let mut slot = None;
        for field in &fields.named {
            let Some(ident) = &field.ident else {
                continue;
            };
            if ident == BASE_FIELD {
                has_base = true;
                base = self.resolve_type(&field.ty);
                if base.is_none() {
                    self.error(
                        field.ty.span(),
                        format!("cannot find type `{}` in this scope", type_text(&field.ty)),
                    );
                }
            } else if is_event_slot(&field.ty) {
                slot = Some(ident.to_string());
            }
        }

        if !has_base {
            self.error(
                item.ident.span(),
                format!("proxy `{name}` has no `{BASE_FIELD}` field"),
            );
        }
        if slot.is_none() {
            self.error(
                item.ident.span(),
                format!("proxy `{name}` has no `{EVENT_SLOT_TYPE}` event slot"),
            );
        }
        if !self.notify_impls.contains(&name) {
            self.error(
                item.ident.span(),
                format!("the trait `{NOTIFY_TRAIT}` is not implemented for `{name}`"),
            );
        }

        let base = base?;
        let slot = slot?;
        if base.sealed {
            self.error(
                fields.named.span(),
                format!(
                    "cannot derive a proxy from sealed type `{}`",
                    base.qualified_name()
                ),
            );
            return None;
        }

        let mut generated = GeneratedType::new(name.clone(), Arc::clone(&base));
        let impls = self.inherent.get(&name).cloned().unwrap_or_default();
        let methods: Vec<&ImplItemFn> = impls
            .into_iter()
            .flat_map(|imp| &imp.items)
            .filter_map(|item| match item {
                ImplItem::Fn(f) => Some(f),
                _ => None,
            })
            .collect();
        let helpers: HashSet<String> = methods
            .iter()
            .filter(|f| receiver_kind(f) == ReceiverKind::Shared)
            .map(|f| f.sig.ident.to_string())
            .collect();

        for method in methods {
            match receiver_kind(method) {
                ReceiverKind::Static if returns_self(method, &name) => {
                    if let Some(ctor) = self.lower_constructor(method, &name, &slot, &base) {
                        generated.add_constructor(ctor);
                    }
                }
                ReceiverKind::Mutable => {
                    if let Some(setter) = self.lower_setter(method, &base, &helpers) {
                        generated.add_setter(setter);
                    }
                }
                _ => {}
            }
        }

        Some(generated)
    }

    fn parameter_names(&mut self, f: &ImplItemFn) -> Option<Vec<String>> {
        let mut names = Vec::new();
        for input in &f.sig.inputs {
            if let FnArg::Typed(typed) = input {
                match &*typed.pat {
                    Pat::Ident(ident) => names.push(ident.ident.to_string()),
                    other => {
                        self.error(
                            other.span(),
                            "parameters of proxy members must be plain identifiers",
                        );
                        return None;
                    }
                }
            }
        }
        Some(names)
    }

    /// Links a pass-through constructor to the base constructor it calls.
    fn lower_constructor(
        &mut self,
        f: &ImplItemFn,
        proxy: &str,
        slot: &str,
        base: &Arc<TargetType>,
    ) -> Option<CompiledConstructor> {
        let fn_name = f.sig.ident.to_string();
        let params = self.parameter_names(f)?;

        let [Stmt::Expr(Expr::Struct(init), None)] = f.block.stmts.as_slice() else {
            self.error(
                f.block.span(),
                format!("constructor `{fn_name}` must build `Self` directly"),
            );
            return None;
        };

        let mut forwarded = None;
        let mut slot_initialised = false;
        for field in &init.fields {
            if let Member::Named(ident) = &field.member {
                if ident == BASE_FIELD {
                    forwarded = Some(&field.expr);
                } else if ident == slot {
                    slot_initialised = true;
                }
            }
        }

        let Some(Expr::Call(call)) = forwarded else {
            self.error(
                init.span(),
                format!("constructor `{fn_name}` must initialise `{BASE_FIELD}` with a constructor call"),
            );
            return None;
        };
        let Expr::Path(func) = &*call.func else {
            self.error(
                call.func.span(),
                format!("constructor `{fn_name}` must call a constructor of `{}`", base.qualified_name()),
            );
            return None;
        };

        let segments = path_segments(&func.path);
        let Some((ctor_name, type_path)) = segments.split_last() else {
            return None;
        };
        let same_type = self
            .resolve_path(type_path)
            .is_some_and(|t| t.qualified_name() == base.qualified_name());
        if !same_type {
            self.error(
                func.span(),
                format!("constructor `{fn_name}` must call a constructor of `{}`", base.qualified_name()),
            );
            return None;
        }

        let Some(base_ctor) = base.find_constructor(ctor_name) else {
            self.error(
                func.span(),
                format!(
                    "no function or associated item named `{ctor_name}` found for `{}`",
                    base.qualified_name()
                ),
            );
            return None;
        };
        if call.args.len() != base_ctor.params.len() {
            self.error(
                call.span(),
                format!(
                    "this function takes {} argument(s) but {} were supplied",
                    base_ctor.params.len(),
                    call.args.len()
                ),
            );
            return None;
        }
        if !forwards_in_order(call.args.iter(), &params) {
            self.error(
                call.span(),
                format!("constructor `{fn_name}` must forward its parameters positionally"),
            );
            return None;
        }
        if !slot_initialised {
            self.error(
                init.span(),
                format!("missing field `{slot}` in initializer of `{proxy}`"),
            );
            return None;
        }

        Some(CompiledConstructor {
            name: fn_name,
            params: base_ctor.params.clone(),
            invoker: base_ctor.invoker.clone(),
        })
    }

    /// Lowers an intercepted setter into its store and notify steps.
    fn lower_setter(
        &mut self,
        f: &ImplItemFn,
        base: &Arc<TargetType>,
        helpers: &HashSet<String>,
    ) -> Option<SetterProgram> {
        let fn_name = f.sig.ident.to_string();
        let params = self.parameter_names(f)?;
        let base_name = base.qualified_name();

        let mut ops = Vec::new();
        let mut property: Option<&PropertyDescriptor> = None;
        let mut failed = false;

        for stmt in &f.block.stmts {
            let Stmt::Expr(Expr::MethodCall(call), _) = stmt else {
                self.error(
                    stmt.span(),
                    format!("unsupported statement in intercepted setter `{fn_name}`"),
                );
                failed = true;
                continue;
            };
            let method = call.method.to_string();

            if is_base_access(&call.receiver) {
                let Some(prop) = base.find_setter(&method) else {
                    self.error(
                        call.method.span(),
                        format!("no method named `{method}` found for `{base_name}`"),
                    );
                    failed = true;
                    continue;
                };
                if let Some(reason) = prop.ineligibility() {
                    self.error(
                        call.method.span(),
                        format!(
                            "cannot intercept property `{}` of `{base_name}`: {reason}",
                            prop.name
                        ),
                    );
                    failed = true;
                    continue;
                }
                if property.is_some() {
                    self.error(
                        call.span(),
                        format!("setter `{fn_name}` stores through the base more than once"),
                    );
                    failed = true;
                    continue;
                }
                let arity = prop.index.len() + 1;
                if call.args.len() != arity {
                    self.error(
                        call.span(),
                        format!(
                            "this method takes {arity} argument(s) but {} were supplied",
                            call.args.len()
                        ),
                    );
                    failed = true;
                    continue;
                }
                if !forwards_in_order(call.args.iter(), &params) {
                    self.error(
                        call.span(),
                        format!("setter `{fn_name}` must forward its parameters positionally"),
                    );
                    failed = true;
                    continue;
                }
                property = Some(prop);
                ops.push(SetterOp::Store);
            } else if is_self(&call.receiver) {
                if !helpers.contains(&method) {
                    self.error(
                        call.method.span(),
                        format!("cannot find method `{method}` on this proxy"),
                    );
                    failed = true;
                    continue;
                }
                let args: Vec<&Expr> = call.args.iter().collect();
                let [
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(literal),
                        ..
                    }),
                ] = args.as_slice()
                else {
                    self.error(
                        call.span(),
                        format!("`{method}` expects a single property name literal"),
                    );
                    failed = true;
                    continue;
                };
                let name = literal.value();
                if base.find_property(&name).is_none() {
                    self.error(
                        literal.span(),
                        format!("no property named `{name}` on `{base_name}`"),
                    );
                    failed = true;
                    continue;
                }
                ops.push(SetterOp::Notify(name));
            } else {
                self.error(
                    call.span(),
                    format!("unsupported statement in intercepted setter `{fn_name}`"),
                );
                failed = true;
            }
        }

        let Some(prop) = property else {
            if !failed {
                self.error(
                    f.sig.ident.span(),
                    format!("setter `{fn_name}` never stores through the base"),
                );
            }
            return None;
        };
        if failed {
            return None;
        }

        Some(SetterProgram {
            property: prop.name.clone(),
            indexed: prop.is_indexed(),
            ops,
        })
    }
}

fn self_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.get_ident().map(ToString::to_string),
        _ => None,
    }
}

fn path_segments(path: &syn::Path) -> Vec<String> {
    path.segments.iter().map(|s| s.ident.to_string()).collect()
}

fn type_text(ty: &Type) -> String {
    match ty {
        Type::Path(path) if path.qself.is_none() => path_segments(&path.path).join("::"),
        other => other.to_token_stream().to_string(),
    }
}

fn is_event_slot(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == EVENT_SLOT_TYPE),
        _ => false,
    }
}

fn receiver_kind(f: &ImplItemFn) -> ReceiverKind {
    match f.sig.receiver() {
        None => ReceiverKind::Static,
        Some(r) if r.reference.is_some() && r.mutability.is_some() => ReceiverKind::Mutable,
        Some(r) if r.reference.is_some() => ReceiverKind::Shared,
        Some(_) => ReceiverKind::Owned,
    }
}

fn returns_self(f: &ImplItemFn, name: &str) -> bool {
    match &f.sig.output {
        ReturnType::Type(_, ty) => match &**ty {
            Type::Path(path) => {
                path.qself.is_none() && (path.path.is_ident("Self") || path.path.is_ident(name))
            }
            _ => false,
        },
        ReturnType::Default => false,
    }
}

fn is_self(expr: &Expr) -> bool {
    matches!(expr, Expr::Path(path) if path.qself.is_none() && path.path.is_ident("self"))
}

fn is_base_access(expr: &Expr) -> bool {
    match expr {
        Expr::Field(field) => {
            is_self(&field.base)
                && matches!(&field.member, Member::Named(ident) if ident == BASE_FIELD)
        }
        _ => false,
    }
}

fn forwards_in_order<'e>(args: impl ExactSizeIterator<Item = &'e Expr>, params: &[String]) -> bool {
    args.len() == params.len()
        && args.zip(params).all(|(arg, param)| {
            matches!(arg, Expr::Path(path) if path.qself.is_none() && path.path.is_ident(param))
        })
}
