//! # notiproxy Schema
//!
//! Reflection inspection and type manifests.
//!
//! This crate provides:
//! - The reflection inspector that selects proxy candidates and computes the
//!   namespace closure of a target type
//! - XML type-manifest parsing for build-time generation
//! - Manifest validation

pub mod error;
pub mod inspector;
pub mod parser;
pub mod validation;

pub use error::{ParseError, SchemaError};
pub use inspector::{InspectedType, inspect};
pub use parser::{Manifest, parse_manifest};
pub use validation::validate_manifest;
