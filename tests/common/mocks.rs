//! Mock ApiFox import service
//!
//! Provides a wiremock server standing in for the import API so tests can
//! assert on the documents the middleware pushes.

#![allow(dead_code)]

use apifox_capture::ApiFoxConfig;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT_ID: &str = "2468";
pub const ACCESS_TOKEN: &str = "APS-test-token";

/// Import endpoint path for [`PROJECT_ID`]
pub fn import_path() -> String {
    format!("/api/v1/projects/{}/import-data", PROJECT_ID)
}

/// Mock of the ApiFox open API
pub struct MockApiFox {
    pub server: MockServer,
}

impl MockApiFox {
    /// Import endpoint that accepts every document
    pub async fn start_accepting() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(import_path()))
            .and(header("x-apifox-version", "2022-11-16"))
            .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"apiCollection": {"item": {"createCount": 1}}}
            })))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Import endpoint that answers with the given status and body
    pub async fn start_replying(status: u16, body: Value) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(import_path()))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Enabled configuration pointing at this mock
    pub fn config(&self) -> ApiFoxConfig {
        ApiFoxConfig::new(PROJECT_ID, ACCESS_TOKEN)
            .with_base_url(self.server.uri())
            .with_app_name("Shop")
    }

    /// Bodies of every import request received so far
    pub async fn imports(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.body_json::<Value>().expect("import body is JSON"))
            .collect()
    }

    /// The OpenAPI document of the only import received
    pub async fn single_document(&self) -> Value {
        let imports = self.imports().await;
        assert_eq!(imports.len(), 1, "expected exactly one import, got {}", imports.len());
        assert_eq!(imports[0]["importFormat"], "openapi");
        imports[0]["data"].clone()
    }
}
