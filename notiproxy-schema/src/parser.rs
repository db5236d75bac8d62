//! Type manifest parser.
//!
//! A manifest describes proxy targets for build-time generation, where no
//! runtime reflection is available:
//!
//! ```xml
//! <proxyManifest>
//!     <type name="Poco" module="demo::model">
//!         <constructor name="new">
//!             <param name="value" type="std::string::String"/>
//!         </constructor>
//!         <property name="Value" type="std::string::String" overridable="true">
//!             <dependsOn>DependantOnValue</dependsOn>
//!         </property>
//!         <property name="DependantOnValue" type="std::string::String" writable="false"/>
//!     </type>
//! </proxyManifest>
//! ```

use crate::error::ParseError;
use notiproxy_core::{
    ConstructorDescriptor, ParameterDescriptor, PropertyDescriptor, TargetType, TypeRef,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parsed manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Declared types in document order.
    pub types: Vec<TargetType>,
}

impl Manifest {
    /// Looks up a type by bare or qualified name.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<&TargetType> {
        self.types
            .iter()
            .find(|t| t.name == name || t.qualified_name() == name)
    }
}

/// Parses a type manifest from a string.
///
/// # Arguments
/// * `xml` - Manifest content
///
/// # Errors
/// Returns `ParseError` if the XML is malformed or an element is invalid.
pub fn parse_manifest(xml: &str) -> Result<Manifest, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut manifest: Option<Manifest> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                match name {
                    "proxyManifest" if manifest.is_none() => {
                        manifest = Some(Manifest::default());
                    }
                    "type" => {
                        if let Some(manifest) = manifest.as_mut() {
                            let ty = parse_type(&mut reader, e)?;
                            manifest.types.push(ty);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                match name {
                    "proxyManifest" if manifest.is_none() => {
                        manifest = Some(Manifest::default());
                    }
                    "type" => {
                        if let Some(manifest) = manifest.as_mut() {
                            manifest.types.push(parse_type_header(e)?);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    manifest.ok_or_else(|| ParseError::InvalidStructure {
        message: "No proxyManifest element found".to_string(),
    })
}

/// Parses the attributes of a `type` element.
fn parse_type_header(e: &BytesStart<'_>) -> Result<TargetType, ParseError> {
    let mut name = None;
    let mut module = String::new();
    let mut sealed = false;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr_value("type", key, &attr.value)?;

        match key {
            "name" => name = Some(value),
            "module" => module = value,
            "sealed" => sealed = parse_bool("type", key, &value)?,
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("type", "name"))?;
    Ok(TargetType::new(name, module).sealed(sealed))
}

/// Parses a `type` element and its members.
fn parse_type(reader: &mut Reader<&[u8]>, e: &BytesStart<'_>) -> Result<TargetType, ParseError> {
    let mut ty = parse_type_header(e)?;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag = std::str::from_utf8(&name_bytes)?;
                match tag {
                    "constructor" => {
                        let ctor = parse_constructor(reader, e)?;
                        ty.constructors.push(ctor);
                    }
                    "property" => {
                        let prop = parse_property(reader, e)?;
                        ty.properties.push(prop);
                    }
                    other => {
                        return Err(ParseError::InvalidStructure {
                            message: format!("unexpected element '{other}' in type '{}'", ty.name),
                        });
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag = std::str::from_utf8(&name_bytes)?;
                match tag {
                    "constructor" => ty.constructors.push(parse_constructor_header(e)?),
                    "property" => ty.properties.push(parse_property_header(e)?),
                    other => {
                        return Err(ParseError::InvalidStructure {
                            message: format!("unexpected element '{other}' in type '{}'", ty.name),
                        });
                    }
                }
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure {
                    message: format!("unterminated type '{}'", ty.name),
                });
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(ty)
}

/// Parses the attributes of a `constructor` element.
fn parse_constructor_header(e: &BytesStart<'_>) -> Result<ConstructorDescriptor, ParseError> {
    let mut name = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        if key == "name" {
            name = Some(attr_value("constructor", key, &attr.value)?);
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("constructor", "name"))?;
    Ok(ConstructorDescriptor::new(name))
}

/// Parses a `constructor` element and its parameters.
fn parse_constructor(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
) -> Result<ConstructorDescriptor, ParseError> {
    let mut ctor = parse_constructor_header(e)?;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag = std::str::from_utf8(&name_bytes)?;
                if tag == "param" {
                    ctor.params.push(parse_parameter("param", e)?);
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"constructor" {
                    break;
                }
            }
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure {
                    message: format!("unterminated constructor '{}'", ctor.name),
                });
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(ctor)
}

/// Parses a `param` or `index` element.
fn parse_parameter(element: &str, e: &BytesStart<'_>) -> Result<ParameterDescriptor, ParseError> {
    let mut name = None;
    let mut ty = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr_value(element, key, &attr.value)?;

        match key {
            "name" => name = Some(value),
            "type" => ty = Some(TypeRef::parse(&value)?),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr(element, "name"))?;
    let ty = ty.ok_or_else(|| ParseError::missing_attr(element, "type"))?;
    Ok(ParameterDescriptor::new(name, ty))
}

/// Parses the attributes of a `property` element.
fn parse_property_header(e: &BytesStart<'_>) -> Result<PropertyDescriptor, ParseError> {
    let mut name = None;
    let mut ty = None;
    let mut readable = true;
    let mut writable = true;
    let mut overridable = false;
    let mut sealed = false;
    let mut no_proxy = false;
    let mut getter = None;
    let mut setter = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr_value("property", key, &attr.value)?;

        match key {
            "name" => name = Some(value),
            "type" => ty = Some(TypeRef::parse(&value)?),
            "readable" => readable = parse_bool("property", key, &value)?,
            "writable" => writable = parse_bool("property", key, &value)?,
            "overridable" => overridable = parse_bool("property", key, &value)?,
            "sealed" => sealed = parse_bool("property", key, &value)?,
            "noProxy" => no_proxy = parse_bool("property", key, &value)?,
            "getter" => getter = Some(value),
            "setter" => setter = Some(value),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("property", "name"))?;
    let ty = ty.ok_or_else(|| ParseError::missing_attr("property", "type"))?;

    let mut prop = PropertyDescriptor::new(name, ty)
        .readable(readable)
        .writable(writable)
        .overridable(overridable)
        .sealed(sealed)
        .no_proxy(no_proxy);
    if let Some(getter) = getter {
        prop = prop.getter(getter);
    }
    if let Some(setter) = setter {
        prop = prop.setter(setter);
    }
    Ok(prop)
}

/// Parses a `property` element with index parameters and dependency markers.
fn parse_property(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
) -> Result<PropertyDescriptor, ParseError> {
    let mut prop = parse_property_header(e)?;
    let mut buf = Vec::new();
    let mut in_depends_on = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                match std::str::from_utf8(&name_bytes)? {
                    "dependsOn" => in_depends_on = true,
                    "index" => prop.index.push(parse_parameter("index", e)?),
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"index" {
                    prop.index.push(parse_parameter("index", e)?);
                }
            }
            Ok(Event::Text(ref t)) if in_depends_on => {
                let text = std::str::from_utf8(t.as_ref())?.trim();
                if !text.is_empty() {
                    prop.depends_on.push(text.to_string());
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"dependsOn" => in_depends_on = false,
                b"property" => break,
                _ => {}
            },
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure {
                    message: format!("unterminated property '{}'", prop.name),
                });
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(prop)
}

/// Decodes and unescapes an attribute value.
fn attr_value(element: &str, key: &str, raw: &[u8]) -> Result<String, ParseError> {
    let raw = std::str::from_utf8(raw)?;
    quick_xml::escape::unescape(raw)
        .map(|v| v.into_owned())
        .map_err(|_| ParseError::invalid_attr(element, key, raw))
}

/// Parses a boolean attribute.
fn parse_bool(element: &str, key: &str, value: &str) -> Result<bool, ParseError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ParseError::invalid_attr(element, key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POCO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<proxyManifest>
    <type name="Poco" module="demo::model">
        <constructor name="new">
            <param name="value" type="std::string::String"/>
        </constructor>
        <constructor name="empty"/>
        <property name="Value" type="std::string::String" overridable="true">
            <dependsOn>DependantOnValue</dependsOn>
            <dependsOn>Summary</dependsOn>
        </property>
        <property name="ShouldNotBeProxied" type="std::string::String" overridable="true" noProxy="true"/>
        <property name="DependantOnValue" type="std::string::String" writable="false"/>
        <property name="Tags" type="std::vec::Vec&lt;std::string::String&gt;" overridable="true" setter="replace_tags"/>
        <property name="Cell" type="u32" overridable="true">
            <index name="row" type="usize"/>
            <index name="column" type="usize"/>
        </property>
    </type>
    <type name="Locked" module="demo::model" sealed="true"/>
</proxyManifest>"#;

    #[test]
    fn test_parse_types() {
        let manifest = parse_manifest(POCO).unwrap();
        assert_eq!(manifest.types.len(), 2);
        let locked = manifest.find_type("demo::model::Locked").unwrap();
        assert!(locked.sealed);
        assert!(locked.properties.is_empty());
    }

    #[test]
    fn test_parse_constructors() {
        let manifest = parse_manifest(POCO).unwrap();
        let poco = manifest.find_type("Poco").unwrap();
        assert_eq!(poco.constructors.len(), 2);
        assert_eq!(
            poco.constructors[0].signature(),
            "new(value: std::string::String)"
        );
        assert!(poco.constructors[1].params.is_empty());
        assert!(poco.constructors[0].invoker.is_none());
    }

    #[test]
    fn test_parse_properties() {
        let manifest = parse_manifest(POCO).unwrap();
        let poco = manifest.find_type("Poco").unwrap();

        let value = poco.find_property("Value").unwrap();
        assert!(value.is_eligible());
        assert_eq!(value.depends_on, vec!["DependantOnValue", "Summary"]);

        assert!(poco.find_property("ShouldNotBeProxied").unwrap().no_proxy);
        assert!(!poco.find_property("DependantOnValue").unwrap().writable);

        let tags = poco.find_property("Tags").unwrap();
        assert_eq!(tags.setter, "replace_tags");
        assert_eq!(tags.value_type.render_with(&|_| false), "Vec<String>");

        let cell = poco.find_property("Cell").unwrap();
        assert_eq!(cell.index.len(), 2);
        assert_eq!(cell.index[1].name, "column");
    }

    #[test]
    fn test_missing_root() {
        let err = parse_manifest("<other/>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure { .. }));
    }

    #[test]
    fn test_missing_type_name() {
        let err = parse_manifest("<proxyManifest><type module=\"m\"/></proxyManifest>").unwrap_err();
        assert!(matches!(err, ParseError::MissingAttribute { .. }));
    }

    #[test]
    fn test_invalid_bool() {
        let xml = r#"<proxyManifest><type name="A" sealed="maybe"/></proxyManifest>"#;
        let err = parse_manifest(xml).unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_invalid_property_type() {
        let xml = r#"<proxyManifest><type name="A"><property name="X" type="Vec&lt;"/></type></proxyManifest>"#;
        let err = parse_manifest(xml).unwrap_err();
        assert!(matches!(err, ParseError::Type(_)));
    }
}
