//! Structured type references.
//!
//! A `TypeRef` is the parsed form of a Rust type name such as
//! `alloc::vec::Vec<alloc::string::String>`. It is used to compute the
//! namespace closure of a type and to render type names into generated code.

use crate::error::{Error, Result};
use std::fmt;

/// A parsed reference to a Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A path type, optionally generic: `std::vec::Vec<T>`.
    Path {
        /// Module path, `None` for primitives and unqualified names.
        namespace: Option<String>,
        /// Last path segment.
        name: String,
        /// Generic arguments.
        args: Vec<TypeRef>,
    },
    /// A reference: `&T` or `&mut T`.
    Reference {
        /// Whether the reference is mutable.
        mutable: bool,
        /// Referenced type.
        inner: Box<TypeRef>,
    },
    /// A tuple, including the unit type.
    Tuple(Vec<TypeRef>),
    /// An array `[T; N]` or a slice `[T]` when `len` is `None`.
    Array {
        /// Element type.
        elem: Box<TypeRef>,
        /// Array length.
        len: Option<usize>,
    },
    /// Anything the parser keeps verbatim (trait objects, function pointers).
    Opaque(String),
}

impl TypeRef {
    /// Describes `T` from its `std::any::type_name`.
    ///
    /// Falls back to an opaque reference if the name cannot be parsed.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        let name = std::any::type_name::<T>();
        Self::parse(name).unwrap_or_else(|_| Self::Opaque(name.to_string()))
    }

    /// Creates a non-generic path type from a qualified name.
    #[must_use]
    pub fn path(qualified: &str) -> Self {
        let qualified = canonical_path(qualified);
        match qualified.rsplit_once("::") {
            Some((namespace, name)) => Self::Path {
                namespace: Some(namespace.to_string()),
                name: name.to_string(),
                args: Vec::new(),
            },
            None => Self::Path {
                namespace: None,
                name: qualified,
                args: Vec::new(),
            },
        }
    }

    /// Parses a type name.
    ///
    /// # Errors
    /// Returns `Error::InvalidTypeName` if the text is not a type.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = TypeParser::new(text);
        let parsed = parser.parse_type()?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(parsed)
    }

    /// Returns the namespace of this type, if it is a qualified path.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Path { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// Returns the bare name of a path type.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Path { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the fully qualified name of a path type, without generics.
    #[must_use]
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            Self::Path {
                namespace: Some(ns),
                name,
                ..
            } => Some(format!("{ns}::{name}")),
            Self::Path {
                namespace: None,
                name,
                ..
            } => Some(name.clone()),
            _ => None,
        }
    }

    /// Appends the namespaces this type depends on, depth-first.
    ///
    /// The type's own namespace comes first, followed by the namespaces of
    /// its generic arguments in order. Duplicates are not removed.
    pub fn collect_namespaces(&self, out: &mut Vec<String>) {
        match self {
            Self::Path {
                namespace, args, ..
            } => {
                if let Some(ns) = namespace {
                    out.push(ns.clone());
                }
                for arg in args {
                    arg.collect_namespaces(out);
                }
            }
            Self::Reference { inner, .. } => inner.collect_namespaces(out),
            Self::Tuple(items) => {
                for item in items {
                    item.collect_namespaces(out);
                }
            }
            Self::Array { elem, .. } => elem.collect_namespaces(out),
            Self::Opaque(_) => {}
        }
    }

    /// Visits every path type in this reference, outermost first.
    pub fn for_each_path(&self, f: &mut dyn FnMut(&TypeRef)) {
        match self {
            Self::Path { args, .. } => {
                f(self);
                for arg in args {
                    arg.for_each_path(f);
                }
            }
            Self::Reference { inner, .. } => inner.for_each_path(f),
            Self::Tuple(items) => {
                for item in items {
                    item.for_each_path(f);
                }
            }
            Self::Array { elem, .. } => elem.for_each_path(f),
            Self::Opaque(_) => {}
        }
    }

    /// Renders the type, qualifying a path only when `qualify` says so.
    #[must_use]
    pub fn render_with(&self, qualify: &dyn Fn(&TypeRef) -> bool) -> String {
        let mut out = String::new();
        self.write_to(&mut out, qualify);
        out
    }

    /// Renders the type with every path fully qualified.
    #[must_use]
    pub fn render_qualified(&self) -> String {
        self.render_with(&|_| true)
    }

    fn write_to(&self, out: &mut String, qualify: &dyn Fn(&TypeRef) -> bool) {
        match self {
            Self::Path {
                namespace,
                name,
                args,
            } => {
                if let Some(ns) = namespace
                    && qualify(self)
                {
                    out.push_str(ns);
                    out.push_str("::");
                }
                out.push_str(name);
                if !args.is_empty() {
                    out.push('<');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        arg.write_to(out, qualify);
                    }
                    out.push('>');
                }
            }
            Self::Reference { mutable, inner } => {
                out.push_str(if *mutable { "&mut " } else { "&" });
                inner.write_to(out, qualify);
            }
            Self::Tuple(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_to(out, qualify);
                }
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Self::Array { elem, len } => {
                out.push('[');
                elem.write_to(out, qualify);
                if let Some(len) = len {
                    out.push_str(&format!("; {len}"));
                }
                out.push(']');
            }
            Self::Opaque(text) => out.push_str(text),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_qualified())
    }
}

/// Maps `core::` and `alloc::` roots onto `std::`.
#[must_use]
pub fn canonical_path(path: &str) -> String {
    for root in ["core::", "alloc::"] {
        if let Some(rest) = path.strip_prefix(root) {
            return format!("std::{rest}");
        }
    }
    path.to_string()
}

/// Returns the path of the item enclosing a type, given its `type_name`.
///
/// Unlike `module_path!()`, this keeps the enclosing function of a type
/// declared inside a function body: `app::setup::Poco` yields `app::setup`.
/// Generic arguments are ignored.
#[must_use]
pub fn enclosing_path(type_name: &str) -> &str {
    let path = type_name.split('<').next().unwrap_or(type_name);
    path.rsplit_once("::").map_or("", |(parent, _)| parent)
}

/// Recursive-descent parser over `type_name` output.
struct TypeParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{token}'")))
        }
    }

    fn error(&self, reason: &str) -> Error {
        Error::InvalidTypeName {
            name: self.text.to_string(),
            reason: format!("{reason} at byte {}", self.pos),
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        self.skip_ws();
        if self.eat("&") {
            self.skip_lifetime();
            let mutable = self.eat_keyword("mut");
            let inner = self.parse_type()?;
            return Ok(TypeRef::Reference {
                mutable,
                inner: Box::new(inner),
            });
        }
        if self.eat("(") {
            let mut items = Vec::new();
            if !self.eat(")") {
                loop {
                    items.push(self.parse_type()?);
                    if self.eat(")") {
                        break;
                    }
                    self.expect(",")?;
                    if self.eat(")") {
                        break;
                    }
                }
            }
            return Ok(TypeRef::Tuple(items));
        }
        if self.eat("[") {
            let elem = self.parse_type()?;
            let len = if self.eat(";") {
                self.skip_ws();
                let digits: String = self.rest().chars().take_while(char::is_ascii_digit).collect();
                if digits.is_empty() {
                    return Err(self.error("expected array length"));
                }
                self.pos += digits.len();
                Some(
                    digits
                        .parse()
                        .map_err(|_| self.error("array length out of range"))?,
                )
            } else {
                None
            };
            self.expect("]")?;
            return Ok(TypeRef::Array {
                elem: Box::new(elem),
                len,
            });
        }
        if self.rest().starts_with("dyn ")
            || self.rest().starts_with("impl ")
            || self.rest().starts_with("fn(")
            || self.rest().starts_with("unsafe ")
            || self.rest().starts_with("extern ")
            || self.rest().starts_with('*')
        {
            return Ok(TypeRef::Opaque(self.take_opaque()));
        }
        self.parse_path()
    }

    fn parse_path(&mut self) -> Result<TypeRef> {
        let mut segments = Vec::new();
        loop {
            let ident = self.parse_ident()?;
            segments.push(ident);
            self.skip_ws();
            if self.rest().starts_with("::") && !self.rest().starts_with("::<") {
                self.pos += 2;
                continue;
            }
            break;
        }
        let mut args = Vec::new();
        self.eat("::");
        if self.eat("<") {
            loop {
                self.skip_ws();
                if self.rest().starts_with('\'') {
                    self.skip_lifetime();
                } else {
                    args.push(self.parse_type()?);
                }
                if self.eat(">") {
                    break;
                }
                self.expect(",")?;
            }
        }
        let name = segments.pop().unwrap_or_default();
        let namespace = if segments.is_empty() {
            None
        } else {
            Some(canonical_path(&segments.join("::")))
        };
        Ok(TypeRef::Path {
            namespace,
            name,
            args,
        })
    }

    fn parse_ident(&mut self) -> Result<String> {
        self.skip_ws();
        let ident: String = self
            .rest()
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if ident.is_empty() {
            return Err(self.error("expected identifier"));
        }
        self.pos += ident.len();
        Ok(ident)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        if rest.starts_with(keyword)
            && rest[keyword.len()..]
                .chars()
                .next()
                .is_some_and(char::is_whitespace)
        {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn skip_lifetime(&mut self) {
        self.skip_ws();
        if self.rest().starts_with('\'') {
            self.pos += 1;
            let len: usize = self
                .rest()
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .map(char::len_utf8)
                .sum();
            self.pos += len;
            self.skip_ws();
        }
    }

    /// Consumes text up to the next top-level `,`, `>`, `)` or `]`.
    fn take_opaque(&mut self) -> String {
        let start = self.pos;
        let mut depth = 0usize;
        let mut prev = ' ';
        for (offset, c) in self.rest().char_indices() {
            let arrow = c == '>' && prev == '-';
            prev = c;
            if arrow {
                continue;
            }
            match c {
                '<' | '(' | '[' => depth += 1,
                '>' | ')' | ']' if depth == 0 => {
                    self.pos = start + offset;
                    return self.text[start..self.pos].trim_end().to_string();
                }
                '>' | ')' | ']' => depth -= 1,
                ',' if depth == 0 => {
                    self.pos = start + offset;
                    return self.text[start..self.pos].trim_end().to_string();
                }
                _ => {}
            }
        }
        self.pos = self.text.len();
        self.text[start..].trim_end().to_string()
    }
}
