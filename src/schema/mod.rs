//! Schema inference module for captured API payloads
//!
//! This module turns captured request/response payloads and declared
//! validation rules into JSON Schema objects for the generated OpenAPI
//! document.

pub mod inference;
pub mod rules;
pub mod value;

pub use inference::{
    classify, merge_rules_and_data, PrimitiveKind, SchemaInferenceEngine, SchemaNode, SchemaType,
};
pub use rules::{AttributeLabels, RuleKind, RuleSet};
pub use value::{FileMarker, Mapping, RuntimeValue};
