//! OpenAPI parameter descriptors for headers, path and query parameters

use http::HeaderMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

use crate::schema::{classify, Mapping, PrimitiveKind, RuntimeValue};

/// `{param}` placeholders in a route template
static PATH_PARAM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("path parameter regex is valid"));

/// Where a parameter lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Header,
    Path,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: PrimitiveKind,
}

/// One entry of an operation's `parameters` list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub description: String,
    pub required: bool,
    pub example: Value,
    pub schema: ParameterSchema,
}

/// Build parameter descriptors from captured parameter values.
///
/// A list contributes its first element as the example. A keyed value
/// (`filter[name]=x`) is documented under the bracketed name of its first
/// key. Every parameter is marked required.
pub fn handle_parameters(
    parameters: &Mapping,
    location: ParameterLocation,
) -> Vec<ParameterDescriptor> {
    parameters
        .iter()
        .map(|(name, value)| {
            let (name, example) = match value {
                RuntimeValue::Sequence(items) => (name.to_string(), items.first().cloned()),
                RuntimeValue::Mapping(map) => match map.first() {
                    Some((key, first)) => (format!("{}[{}]", name, key), Some(first.clone())),
                    None => (name.to_string(), None),
                },
                scalar => (name.to_string(), Some(scalar.clone())),
            };
            let example = example.unwrap_or_else(|| RuntimeValue::String(String::new()));

            ParameterDescriptor {
                name,
                location,
                description: String::new(),
                required: true,
                schema: ParameterSchema { kind: classify(&example) },
                example: example.to_json(),
            }
        })
        .collect()
}

/// Names of the `{param}` placeholders in a route template, in order
pub fn path_parameter_names(uri_template: &str) -> Vec<String> {
    PATH_PARAM_REGEX.captures_iter(uri_template).map(|c| c[1].to_string()).collect()
}

/// Path parameters of a route template, each with an empty example
pub fn path_parameters(uri_template: &str) -> Mapping {
    path_parameter_names(uri_template)
        .into_iter()
        .map(|name| (name, RuntimeValue::Sequence(vec![RuntimeValue::String(String::new())])))
        .collect()
}

/// Request headers as parameter values, one list of values per header name
pub fn header_parameters(headers: &HeaderMap) -> Mapping {
    let mut mapping = Mapping::new();
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|v| RuntimeValue::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        mapping.insert(name.as_str(), RuntimeValue::Sequence(values));
    }
    mapping
}
