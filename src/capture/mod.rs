//! # Traffic Capture
//!
//! Captured request/response pairs and the axum middleware that records
//! them while tests run. Captured bodies are decoded into
//! [`RuntimeValue`](crate::schema::RuntimeValue) trees; the raw bytes are
//! only kept as an example string.

pub mod form;
pub mod middleware;

pub use middleware::{capture_api_docs, ApiDocState};

use bytes::Bytes;
use http::{header, HeaderMap, Method, StatusCode};
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::schema::{Mapping, RuntimeValue};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_MULTIPART: &str = "multipart/form-data";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Media type without parameters, lowercased
/// (`application/json; charset=utf-8` → `application/json`)
pub fn media_type(content_type: &str) -> String {
    content_type
        .parse::<mime::Mime>()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|_| {
            content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
        })
}

/// Whether a media type carries JSON (`application/json`, `application/problem+json`, ...)
pub fn is_json_media_type(media_type: &str) -> bool {
    media_type == CONTENT_TYPE_JSON || media_type.ends_with("+json")
}

fn header_media_type(headers: &HeaderMap) -> Option<String> {
    headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(media_type)
}

/// Top-level JSON body as field mapping. Lists are keyed by index.
fn json_body_fields(value: Value) -> Mapping {
    match RuntimeValue::from(value) {
        RuntimeValue::Mapping(map) => map,
        RuntimeValue::Sequence(items) => {
            items.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect()
        }
        _ => Mapping::new(),
    }
}

/// A request observed by the capture middleware
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    /// Route template with `{param}` placeholders
    pub uri_template: String,
    pub headers: HeaderMap,
    pub query: Mapping,
    /// Body fields including uploaded file markers
    pub body: Mapping,
    /// Raw body text, used as the request example
    pub raw_body: Option<String>,
    /// Media type of the body
    pub content_type: Option<String>,
}

impl CapturedRequest {
    pub fn new<S: Into<String>>(method: Method, uri_template: S) -> Self {
        Self {
            method,
            uri_template: uri_template.into(),
            headers: HeaderMap::new(),
            query: Mapping::new(),
            body: Mapping::new(),
            raw_body: None,
            content_type: None,
        }
    }

    pub fn with_query_string(mut self, query: &str) -> Self {
        self.query = form::parse_form(query);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.content_type = header_media_type(&headers).or(self.content_type);
        self.headers = headers;
        self
    }

    pub fn with_json_body(mut self, body: Value) -> Self {
        self.raw_body = Some(body.to_string());
        self.body = json_body_fields(body);
        self.content_type = Some(CONTENT_TYPE_JSON.to_string());
        self
    }

    pub fn with_form_body(mut self, body: &str) -> Self {
        self.raw_body = Some(body.to_string());
        self.body = form::parse_form(body);
        self.content_type = Some(CONTENT_TYPE_FORM.to_string());
        self
    }

    /// Decode a raw body according to the request's content type.
    ///
    /// JSON and urlencoded bodies are decoded here; multipart bodies need
    /// the async decoder in [`form::parse_multipart`].
    pub fn with_raw_body(mut self, body: &Bytes) -> Result<Self> {
        if body.is_empty() {
            return Ok(self);
        }
        let text = String::from_utf8_lossy(body).into_owned();
        match self.content_type.as_deref() {
            Some(ct) if is_json_media_type(ct) => {
                let value: Value = serde_json::from_slice(body)
                    .map_err(|e| Error::validation(format!("Invalid JSON request body: {}", e)))?;
                self.body = json_body_fields(value);
            }
            Some(CONTENT_TYPE_FORM) => self.body = form::parse_form(&text),
            _ => {}
        }
        self.raw_body = Some(text);
        Ok(self)
    }

    /// Whether any body field is an uploaded file
    pub fn has_files(&self) -> bool {
        fn contains_file(value: &RuntimeValue) -> bool {
            match value {
                RuntimeValue::File(_) => true,
                RuntimeValue::Sequence(items) => items.iter().any(contains_file),
                RuntimeValue::Mapping(map) => map.iter().any(|(_, v)| contains_file(v)),
                _ => false,
            }
        }
        self.body.iter().any(|(_, v)| contains_file(v))
    }

    /// Route template with a leading slash
    pub fn path(&self) -> String {
        if self.uri_template.starts_with('/') {
            self.uri_template.clone()
        } else {
            format!("/{}", self.uri_template)
        }
    }
}

/// Body of a captured response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    /// A file download; its contents are not documented
    File,
    Empty,
}

/// A response observed by the capture middleware
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: ResponseBody,
}

impl CapturedResponse {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            content_type: Some(CONTENT_TYPE_JSON.to_string()),
            body: ResponseBody::Json(body),
        }
    }

    pub fn text<S: Into<String>>(status: StatusCode, content_type: &str, body: S) -> Self {
        Self {
            status,
            content_type: Some(media_type(content_type)),
            body: ResponseBody::Text(body.into()),
        }
    }

    /// Classify a raw response by its headers.
    ///
    /// JSON content types are parsed (falling back to text when the body is
    /// not valid JSON), `Content-Disposition: attachment` marks a download,
    /// and everything else is kept as text.
    pub fn from_parts(status: StatusCode, headers: &HeaderMap, body: &Bytes) -> Self {
        let content_type = header_media_type(headers);
        let is_download = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("attachment"));

        let body = if is_download {
            ResponseBody::File
        } else if body.is_empty() {
            ResponseBody::Empty
        } else if content_type.as_deref().is_some_and(is_json_media_type) {
            serde_json::from_slice(body)
                .map(ResponseBody::Json)
                .unwrap_or_else(|_| ResponseBody::Text(String::from_utf8_lossy(body).into_owned()))
        } else {
            ResponseBody::Text(String::from_utf8_lossy(body).into_owned())
        };

        Self { status, content_type, body }
    }

    /// Response payload as a runtime value; downloads and empty bodies are empty
    pub fn data(&self) -> RuntimeValue {
        match &self.body {
            ResponseBody::Json(value) => RuntimeValue::from(value.clone()),
            ResponseBody::Text(text) => RuntimeValue::String(text.clone()),
            ResponseBody::File | ResponseBody::Empty => RuntimeValue::Mapping(Mapping::new()),
        }
    }
}
