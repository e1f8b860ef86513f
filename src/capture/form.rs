//! Decoding of query strings, urlencoded forms and multipart bodies
//!
//! Field names use bracket paths: `user[name]=x` nests, `tags[]=a&tags[]=b`
//! appends, and `tags[1]=x` addresses an index. Indexed fields that include
//! index 0 become lists; sparse ones stay keyed mappings.

use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use bytes::Bytes;
use http::{header, HeaderMap, Request};
use std::collections::HashMap;

use crate::errors::{Error, Result};
use crate::schema::rules::{normalize_indexed, parse_path};
use crate::schema::{FileMarker, Mapping, RuntimeValue};

/// Parse a query string or urlencoded form body
pub fn parse_form(input: &str) -> Mapping {
    let input = input.trim_start_matches('?');
    let mut fields = FormFields::default();
    for (name, value) in url::form_urlencoded::parse(input.as_bytes()) {
        fields.set(&name, RuntimeValue::String(value.into_owned()));
    }
    fields.finish()
}

/// Parse a multipart body. Uploaded files become [`FileMarker`]s.
pub async fn parse_multipart(headers: &HeaderMap, body: Bytes) -> Result<Mapping> {
    let mut builder = Request::builder();
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder
        .body(Body::from(body))
        .map_err(|e| Error::internal(format!("Failed to rebuild multipart request: {}", e)))?;

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| Error::validation(format!("Invalid multipart body: {}", e)))?;

    let mut fields = FormFields::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Invalid multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| {
                Error::validation(format!("Failed to read multipart field '{}': {}", name, e))
            })?;

        let value = match file_name {
            Some(file_name) => {
                RuntimeValue::File(FileMarker { file_name, content_type, size: data.len() })
            }
            None => RuntimeValue::String(String::from_utf8_lossy(&data).into_owned()),
        };
        fields.set(&name, value);
    }

    Ok(fields.finish())
}

fn normalize_fields(fields: Mapping) -> Mapping {
    fields.into_iter().map(|(key, value)| (key, normalize_indexed(value))).collect()
}

/// Fields decoded so far, with the next `[]` append index per parent path
#[derive(Default)]
struct FormFields {
    fields: Mapping,
    next_append: HashMap<Vec<String>, usize>,
}

impl FormFields {
    /// Set a field at its bracket path. Later values overwrite earlier ones.
    fn set(&mut self, name: &str, value: RuntimeValue) {
        let segments = parse_path(name);
        if segments.first().is_none_or(|s| s.is_empty()) {
            return;
        }

        let mut parent: Vec<String> = Vec::with_capacity(segments.len());
        let mut target = &mut self.fields;
        for (depth, segment) in segments.iter().enumerate() {
            let next = self.next_append.entry(parent.clone()).or_insert(0);
            let key = if segment.is_empty() { next.to_string() } else { segment.clone() };
            if let Ok(index) = key.parse::<usize>() {
                *next = (*next).max(index + 1);
            }

            if depth + 1 == segments.len() {
                target.insert(key, value);
                return;
            }

            match target.get(&key) {
                Some(RuntimeValue::Mapping(_)) => {}
                existing => {
                    let replaced = existing.is_some();
                    target.insert(key.clone(), RuntimeValue::Mapping(Mapping::new()));
                    if replaced {
                        let mut child = parent.clone();
                        child.push(key.clone());
                        self.next_append.retain(|path, _| !path.starts_with(&child));
                    }
                }
            }

            parent.push(key.clone());
            target = match target.get_mut(&key) {
                Some(RuntimeValue::Mapping(child)) => child,
                _ => return,
            };
        }
    }

    fn finish(self) -> Mapping {
        normalize_fields(self.fields)
    }
}
