//! Schema inference engine for captured payloads
//!
//! Turns a captured request or response payload, plus the validation rules
//! and attribute labels declared for the endpoint, into a JSON Schema object
//! in the dialect the ApiFox importer reads (OpenAPI 3.1 types with
//! `x-apifox-*` extensions). Only structure is kept: example values never
//! end up inside the schema.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

use super::rules::{
    insert_if_absent, is_required, normalize_indexed, AttributeLabels, RuleKind, RuleSet,
};
use super::value::{Mapping, RuntimeValue};
use crate::errors::{Error, Result};

/// Primitive JSON Schema type of a runtime value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Object => "object",
            PrimitiveKind::Array => "array",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `type` of a schema node: a single kind, or the kind paired with `"null"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    Single(PrimitiveKind),
    Nullable(PrimitiveKind),
}

impl SchemaType {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            SchemaType::Single(kind) | SchemaType::Nullable(kind) => *kind,
        }
    }
}

impl Serialize for SchemaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SchemaType::Single(kind) => serializer.serialize_str(kind.as_str()),
            SchemaType::Nullable(kind) => [kind.as_str(), "null"].serialize(serializer),
        }
    }
}

/// Object properties in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, SchemaNode)>);

impl Properties {
    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, key: String, node: SchemaNode) {
        self.0.push((key, node));
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, node) in &self.0 {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

/// One JSON-Schema-shaped descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaNode {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,

    /// Property keys in the order they were observed
    #[serde(rename = "x-apifox-orders", skip_serializing_if = "Option::is_none")]
    pub ordered_keys: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(rename = "x-apifox-ignore-properties", skip_serializing_if = "Option::is_none")]
    pub ignore_properties: Option<Vec<String>>,
}

impl SchemaNode {
    /// A bare node of a single kind
    pub fn new(kind: PrimitiveKind) -> Self {
        Self::with_type(SchemaType::Single(kind))
    }

    pub fn with_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            title: None,
            format: None,
            description: None,
            properties: Properties::default(),
            items: None,
            ordered_keys: None,
            required: None,
            ignore_properties: None,
        }
    }

    pub fn property(&self, key: &str) -> Option<&SchemaNode> {
        self.properties.get(key)
    }

    /// Serialize into a JSON value for embedding in a document
    pub fn to_json(&self) -> serde_json::Value {
        // SchemaNode contains only strings, lists and maps with string keys.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Classify a runtime value into its primitive JSON Schema kind.
///
/// Sparse lists reach this function as mappings (see
/// [`RuntimeValue::from_indexed`]), so a list without an index-0 element is
/// an object here.
pub fn classify(value: &RuntimeValue) -> PrimitiveKind {
    match value {
        RuntimeValue::Number(_) => PrimitiveKind::Number,
        RuntimeValue::Binary(_) => PrimitiveKind::String,
        RuntimeValue::Sequence(_) => PrimitiveKind::Array,
        RuntimeValue::Mapping(_) | RuntimeValue::File(_) => PrimitiveKind::Object,
        RuntimeValue::Bool(_) => PrimitiveKind::Boolean,
        RuntimeValue::String(_) | RuntimeValue::Null => PrimitiveKind::String,
    }
}

/// Merge placeholders for every validated field with the observed data.
///
/// Each rule path gets a typed placeholder unless an earlier rule already
/// filled it. Observed data is then laid over the placeholders: observed
/// values always win, and nested mappings are merged so placeholders only
/// fill gaps. Placeholder keys come first, in rule order.
pub fn merge_rules_and_data(rules: &RuleSet, data: &Mapping) -> Mapping {
    let mut placeholders = Mapping::new();
    for (path, rule) in rules.iter() {
        insert_if_absent(&mut placeholders, path, RuleKind::from_rule(rule).placeholder());
    }

    let mut merged: Mapping =
        placeholders.into_iter().map(|(key, value)| (key, normalize_indexed(value))).collect();
    overlay(&mut merged, data);
    merged
}

fn overlay(target: &mut Mapping, data: &Mapping) {
    for (key, value) in data.iter() {
        match (target.get_mut(key), value) {
            (Some(RuntimeValue::Mapping(existing)), RuntimeValue::Mapping(incoming)) => {
                overlay(existing, incoming);
            }
            _ => {
                target.insert(key, value.clone());
            }
        }
    }
}

/// Description attached to uploaded-file properties
const FILE_DESCRIPTION: &str = "file";

/// Schema inference engine
#[derive(Debug, Clone)]
pub struct SchemaInferenceEngine;

impl SchemaInferenceEngine {
    /// Create a new schema inference engine
    pub fn new() -> Self {
        Self
    }

    /// Generate an object schema for `data`.
    ///
    /// Fields named in `rules` but missing from `data` still appear, typed
    /// from their rule. A property is nullable unless its rule says
    /// `required`. Nested objects are generated without rules, so their
    /// properties are always nullable.
    pub fn gen_schema(
        &self,
        data: &Mapping,
        rules: &RuleSet,
        attributes: &AttributeLabels,
    ) -> SchemaNode {
        let merged = merge_rules_and_data(rules, data);
        let mut schema = SchemaNode::new(PrimitiveKind::Object);

        for (key, value) in merged.iter() {
            let kind = classify(value);
            if kind == PrimitiveKind::Object {
                let mut node = self.object_schema(value);
                if !matches!(value, RuntimeValue::File(_)) {
                    node.title = Some(attributes.title(key));
                }
                schema.properties.push(key.to_string(), node);
                continue;
            }

            let required = rules.get(key).is_some_and(is_required);
            let schema_type =
                if required { SchemaType::Single(kind) } else { SchemaType::Nullable(kind) };
            let mut node = SchemaNode::with_type(schema_type);
            node.title = Some(attributes.title(key));
            if kind == PrimitiveKind::Array {
                node.items = Some(Box::new(self.items_schema(value)));
            }
            schema.properties.push(key.to_string(), node);
        }

        schema.ordered_keys = Some(merged.keys().map(str::to_string).collect());
        schema.required = Some(rules.required_paths());
        schema.ignore_properties = Some(Vec::new());

        debug!(
            properties = schema.properties.len(),
            rules = rules.iter().count(),
            "Generated object schema"
        );

        schema
    }

    /// Infer a schema for a payload of any shape.
    ///
    /// Mappings go through [`gen_schema`](Self::gen_schema) without rules.
    /// Lists become an array node with an `items` descriptor and scalars a
    /// bare node. Empty payloads produce an empty object schema.
    pub fn infer_value_schema(&self, value: &RuntimeValue) -> SchemaNode {
        if value.is_empty() {
            return self.gen_schema(&Mapping::new(), &RuleSet::new(), &AttributeLabels::new());
        }
        match value {
            RuntimeValue::Mapping(map) => {
                self.gen_schema(map, &RuleSet::new(), &AttributeLabels::new())
            }
            RuntimeValue::File(_) => self.file_schema(),
            RuntimeValue::Sequence(_) => {
                let mut node = SchemaNode::new(PrimitiveKind::Array);
                node.items = Some(Box::new(self.items_schema(value)));
                node
            }
            other => SchemaNode::new(classify(other)),
        }
    }

    /// Infer a schema from a JSON string
    pub fn infer_from_json(&self, json_str: &str) -> Result<SchemaNode> {
        let value: serde_json::Value = serde_json::from_str(json_str)
            .map_err(|e| Error::validation(format!("Invalid JSON payload: {}", e)))?;
        Ok(self.infer_value_schema(&RuntimeValue::from(value)))
    }

    fn object_schema(&self, value: &RuntimeValue) -> SchemaNode {
        match value {
            RuntimeValue::File(_) => self.file_schema(),
            RuntimeValue::Mapping(map) => {
                self.gen_schema(map, &RuleSet::new(), &AttributeLabels::new())
            }
            other => SchemaNode::new(classify(other)),
        }
    }

    fn items_schema(&self, list: &RuntimeValue) -> SchemaNode {
        match list.first_element() {
            Some(first) if classify(first) == PrimitiveKind::Object => self.object_schema(first),
            Some(first) => SchemaNode::new(classify(first)),
            None => SchemaNode::new(PrimitiveKind::String),
        }
    }

    fn file_schema(&self) -> SchemaNode {
        let mut node = SchemaNode::new(PrimitiveKind::String);
        node.format = Some("binary".to_string());
        node.description = Some(FILE_DESCRIPTION.to_string());
        node
    }
}

impl Default for SchemaInferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}
