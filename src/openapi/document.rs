//! OpenAPI 3.1 document generation for a captured exchange
//!
//! The document carries a single path and operation. ApiFox merges imported
//! documents into the project, so each documented test produces its own
//! small document rather than one aggregate.

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::metadata::EndpointDoc;
use super::parameters::{
    handle_parameters, header_parameters, path_parameters, ParameterDescriptor, ParameterLocation,
};
use crate::capture::{
    is_json_media_type, CapturedRequest, CapturedResponse, CONTENT_TYPE_JSON,
    CONTENT_TYPE_MULTIPART, CONTENT_TYPE_OCTET_STREAM,
};
use crate::config::ApiFoxConfig;
use crate::schema::{SchemaInferenceEngine, SchemaNode};

pub const OPENAPI_VERSION: &str = "3.1.0";
const STATUS_PENDING: &str = "pending";
const EXAMPLE_SUMMARY: &str = "Example";
const SUCCESS_DESCRIPTION: &str = "Success";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectInfo {
    pub title: String,
    pub description: String,
    pub version: String,
}

impl ProjectInfo {
    pub fn from_config(config: &ApiFoxConfig) -> Self {
        Self {
            title: config.app_name.clone(),
            description: String::new(),
            version: config.app_version.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    pub summary: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaType {
    pub schema: SchemaNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<BTreeMap<String, Example>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSpec {
    pub description: String,
    pub content: BTreeMap<String, MediaType>,
}

/// One documented operation, including the ApiFox folder/status extensions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiOperation {
    pub summary: String,
    #[serde(rename = "x-apifox-folder")]
    pub folder: String,
    #[serde(rename = "x-apifox-status")]
    pub status: String,
    pub deprecated: bool,
    pub description: String,
    pub tags: Vec<String>,
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, ResponseSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: ProjectInfo,
    pub tags: Vec<Tag>,
    pub paths: BTreeMap<String, BTreeMap<String, ApiOperation>>,
}

impl OpenApiDocument {
    /// The single operation of a captured document, if any
    pub fn operation(&self, path: &str, method: &str) -> Option<&ApiOperation> {
        self.paths.get(path).and_then(|ops| ops.get(method))
    }

    pub fn to_json(&self) -> crate::errors::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Builds documents from captured exchanges
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    engine: SchemaInferenceEngine,
    info: ProjectInfo,
}

impl DocumentBuilder {
    pub fn new(info: ProjectInfo) -> Self {
        Self { engine: SchemaInferenceEngine::new(), info }
    }

    pub fn build(
        &self,
        doc: &EndpointDoc,
        request: &CapturedRequest,
        response: &CapturedResponse,
    ) -> OpenApiDocument {
        let path = request.path();
        let method = request.method.as_str().to_ascii_lowercase();
        let operation = self.operation(doc, request, response);

        debug!(
            path = %path,
            method = %method,
            parameters = operation.parameters.len(),
            has_request_body = operation.request_body.is_some(),
            "Built OpenAPI operation from captured exchange"
        );

        let mut operations = BTreeMap::new();
        operations.insert(method, operation);
        let mut paths = BTreeMap::new();
        paths.insert(path, operations);

        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info.clone(),
            tags: doc.folder_tags().into_iter().map(|name| Tag { name }).collect(),
            paths,
        }
    }

    fn operation(
        &self,
        doc: &EndpointDoc,
        request: &CapturedRequest,
        response: &CapturedResponse,
    ) -> ApiOperation {
        let mut parameters = Vec::new();
        if doc.with_headers {
            let headers = header_parameters(&request.headers);
            parameters.extend(handle_parameters(&headers, ParameterLocation::Header));
        }
        let path = path_parameters(&request.uri_template);
        parameters.extend(handle_parameters(&path, ParameterLocation::Path));
        parameters.extend(handle_parameters(&request.query, ParameterLocation::Query));

        let mut responses = BTreeMap::new();
        responses.insert(response.status.as_u16().to_string(), self.response_spec(response));

        ApiOperation {
            summary: doc.summary(&request.uri_template),
            folder: doc.folder.clone(),
            status: STATUS_PENDING.to_string(),
            deprecated: doc.deprecated,
            description: doc.description.clone(),
            tags: if doc.folder.is_empty() { Vec::new() } else { vec![doc.folder.clone()] },
            parameters,
            request_body: self.request_body(doc, request),
            responses,
        }
    }

    fn request_body(&self, doc: &EndpointDoc, request: &CapturedRequest) -> Option<RequestBody> {
        if request.body.is_empty() {
            return None;
        }

        let content_type = if request.has_files() {
            CONTENT_TYPE_MULTIPART.to_string()
        } else {
            request.content_type.clone().unwrap_or_else(|| CONTENT_TYPE_JSON.to_string())
        };

        let example = match request.raw_body.as_deref() {
            Some(raw) if !raw.is_empty() && content_type != CONTENT_TYPE_MULTIPART => {
                if is_json_media_type(&content_type) {
                    let parsed = serde_json::from_str(raw);
                    Some(parsed.unwrap_or_else(|_| Value::String(raw.to_string())))
                } else {
                    Some(Value::String(raw.to_string()))
                }
            }
            _ => None,
        };

        let media = MediaType {
            schema: self.engine.gen_schema(&request.body, &doc.rules, &doc.attributes),
            example,
            examples: None,
        };

        let mut content = BTreeMap::new();
        content.insert(content_type, media);
        Some(RequestBody { content })
    }

    fn response_spec(&self, response: &CapturedResponse) -> ResponseSpec {
        let data = response.data();
        let content_type = if data.is_empty() {
            CONTENT_TYPE_OCTET_STREAM.to_string()
        } else {
            response.content_type.clone().unwrap_or_else(|| CONTENT_TYPE_JSON.to_string())
        };

        let examples = (!data.is_empty()).then(|| {
            let mut examples = BTreeMap::new();
            examples.insert(
                "1".to_string(),
                Example { summary: EXAMPLE_SUMMARY.to_string(), value: data.to_json() },
            );
            examples
        });

        let schema = self.engine.infer_value_schema(&data);
        let media = MediaType { schema, example: None, examples };
        let mut content = BTreeMap::new();
        content.insert(content_type, media);

        ResponseSpec { description: status_description(response.status), content }
    }
}

/// `Success` for 200, otherwise the status's canonical reason phrase
pub fn status_description(status: StatusCode) -> String {
    if status == StatusCode::OK {
        SUCCESS_DESCRIPTION.to_string()
    } else {
        status.canonical_reason().unwrap_or_default().to_string()
    }
}
