//! Dependency annotation resolver.
//!
//! Expands the dependency placeholder of a rendered property into one
//! notify call per dependency marker on the property.

use notiproxy_core::PropertyDescriptor;

/// Placeholder key left in property text by the template renderer.
pub const DEPENDENCY_PLACEHOLDER: &str = "dependencies";

/// Notify method used when the placeholder does not name one.
pub const DEFAULT_NOTIFY_METHOD: &str = "on_property_changed";

/// Replaces the dependency placeholder in `text`.
///
/// The placeholder is `{{dependencies}}` or `{{dependencies:method}}`. Each
/// dependency marker of `property` becomes `self.method("Name");`, in
/// declaration order. A placeholder alone on its line is replaced line by
/// line at the same indentation, and the line is dropped when there are no
/// markers. Text without a placeholder is returned unchanged.
///
/// Names are not checked against the type; an unknown name is reported by
/// the compiler backend.
#[must_use]
pub fn resolve_dependencies(text: &str, property: &PropertyDescriptor) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(found) = find_placeholder(rest) {
        let statements: Vec<String> = property
            .depends_on
            .iter()
            .map(|dep| format!("self.{}({:?});", found.method, dep))
            .collect();

        let line_start = rest[..found.start].rfind('\n').map_or(0, |i| i + 1);
        let indent = &rest[line_start..found.start];
        let line_end = rest[found.end..]
            .find('\n')
            .map_or(rest.len(), |i| found.end + i + 1);
        let alone = indent.chars().all(char::is_whitespace)
            && rest[found.end..line_end].trim().is_empty();

        if alone {
            out.push_str(&rest[..line_start]);
            let newline = rest[..line_end].ends_with('\n');
            for (i, statement) in statements.iter().enumerate() {
                out.push_str(indent);
                out.push_str(statement);
                if newline || i + 1 < statements.len() {
                    out.push('\n');
                }
            }
            rest = &rest[line_end..];
        } else {
            out.push_str(&rest[..found.start]);
            out.push_str(&statements.join(" "));
            rest = &rest[found.end..];
        }
    }

    out.push_str(rest);
    out
}

struct Placeholder<'a> {
    start: usize,
    end: usize,
    method: &'a str,
}

fn find_placeholder(text: &str) -> Option<Placeholder<'_>> {
    let open = format!("{{{{{DEPENDENCY_PLACEHOLDER}");
    let mut from = 0;
    while let Some(pos) = text[from..].find(&open) {
        let start = from + pos;
        let tail = &text[start + open.len()..];
        if let Some(after) = tail.strip_prefix("}}") {
            return Some(Placeholder {
                start,
                end: text.len() - after.len(),
                method: DEFAULT_NOTIFY_METHOD,
            });
        }
        if let Some(named) = tail.strip_prefix(':')
            && let Some(close) = named.find("}}")
        {
            let method = named[..close].trim();
            return Some(Placeholder {
                start,
                end: start + open.len() + 1 + close + 2,
                method: if method.is_empty() {
                    DEFAULT_NOTIFY_METHOD
                } else {
                    method
                },
            });
        }
        from = start + open.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use notiproxy_core::TypeRef;

    const SETTER: &str = "    pub fn set_value(&mut self, value: String) {\n        self.base.set_value(value);\n        self.on_property_changed(\"Value\");\n        {{dependencies}}\n    }\n";

    fn value() -> PropertyDescriptor {
        PropertyDescriptor::new("Value", TypeRef::of::<String>()).overridable(true)
    }

    #[test]
    fn test_dependencies_in_order() {
        let prop = value().depends_on("DependantOnValue").depends_on("Summary");
        let resolved = resolve_dependencies(SETTER, &prop);
        assert_eq!(
            resolved,
            "    pub fn set_value(&mut self, value: String) {\n        self.base.set_value(value);\n        self.on_property_changed(\"Value\");\n        self.on_property_changed(\"DependantOnValue\");\n        self.on_property_changed(\"Summary\");\n    }\n"
        );
    }

    #[test]
    fn test_no_dependencies_drops_line() {
        let resolved = resolve_dependencies(SETTER, &value());
        assert_eq!(
            resolved,
            "    pub fn set_value(&mut self, value: String) {\n        self.base.set_value(value);\n        self.on_property_changed(\"Value\");\n    }\n"
        );
    }

    #[test]
    fn test_placeholder_absent() {
        let text = "fn f() {}\n";
        assert_eq!(resolve_dependencies(text, &value().depends_on("X")), text);
    }

    #[test]
    fn test_named_method() {
        let prop = value().depends_on("Total");
        let resolved = resolve_dependencies("  {{dependencies:notify}}\n", &prop);
        assert_eq!(resolved, "  self.notify(\"Total\");\n");
    }

    #[test]
    fn test_inline_placeholder() {
        let prop = value().depends_on("A").depends_on("B");
        let resolved = resolve_dependencies("x(); {{dependencies}} y();", &prop);
        assert_eq!(
            resolved,
            "x(); self.on_property_changed(\"A\"); self.on_property_changed(\"B\"); y();"
        );
    }

    #[test]
    fn test_names_are_escaped() {
        let prop = value().depends_on("Odd\"Name");
        let resolved = resolve_dependencies("{{dependencies}}", &prop);
        assert_eq!(resolved, "self.on_property_changed(\"Odd\\\"Name\");");
    }

    #[test]
    fn test_unknown_name_passes_through() {
        let prop = value().depends_on("DoesNotExist");
        let resolved = resolve_dependencies("{{dependencies}}\n", &prop);
        assert_eq!(resolved, "self.on_property_changed(\"DoesNotExist\");\n");
    }
}
