//! Reflection inspector.
//!
//! Flattens a `TargetType` into what the source assembler needs: the
//! properties that can be intercepted, the constructors to forward and the
//! namespaces the generated code has to import.

use notiproxy_core::{ConstructorDescriptor, PropertyDescriptor, TargetType, TypeRef};
use std::collections::HashSet;
use std::sync::Arc;

/// Inspection result for one target type.
#[derive(Debug, Clone)]
pub struct InspectedType {
    /// The inspected type.
    pub target: Arc<TargetType>,
    /// Eligible properties in declaration order.
    pub properties: Vec<PropertyDescriptor>,
    /// Constructors in declaration order.
    pub constructors: Vec<ConstructorDescriptor>,
    /// Namespace closure, first occurrence order, without duplicates.
    pub namespaces: Vec<String>,
}

impl InspectedType {
    /// Returns every type reference the generated code will spell out.
    pub fn type_refs(&self) -> impl Iterator<Item = &TypeRef> {
        let properties = self
            .properties
            .iter()
            .flat_map(|p| std::iter::once(&p.value_type).chain(p.index.iter().map(|i| &i.ty)));
        let constructors = self
            .constructors
            .iter()
            .flat_map(|c| c.params.iter().map(|p| &p.ty));
        properties.chain(constructors)
    }
}

/// Inspects a target type.
///
/// Ineligible properties are excluded and logged at debug level; this is
/// not an error.
#[must_use]
pub fn inspect(target: &Arc<TargetType>) -> InspectedType {
    let mut properties = Vec::new();
    for prop in &target.properties {
        match prop.ineligibility() {
            None => properties.push(prop.clone()),
            Some(reason) => {
                tracing::debug!(
                    "Excluding property {}.{} from proxying: {}",
                    target.name,
                    prop.name,
                    reason
                );
            }
        }
    }

    let mut closure = Vec::new();
    if !target.module_path.is_empty() {
        closure.push(target.module_path.clone());
    }
    for prop in &properties {
        prop.value_type.collect_namespaces(&mut closure);
        for index in &prop.index {
            index.ty.collect_namespaces(&mut closure);
        }
    }
    for ctor in &target.constructors {
        for param in &ctor.params {
            param.ty.collect_namespaces(&mut closure);
        }
    }

    let mut seen = HashSet::new();
    let namespaces = closure
        .into_iter()
        .filter(|ns| seen.insert(ns.clone()))
        .collect();

    InspectedType {
        target: Arc::clone(target),
        properties,
        constructors: target.constructors.clone(),
        namespaces,
    }
}
