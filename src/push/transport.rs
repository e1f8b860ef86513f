//! HTTP transport for the ApiFox import API

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use crate::errors::{Error, Result};

/// Header carrying the import API version
pub const API_VERSION_HEADER: &str = "X-Apifox-Version";

/// Body of an import call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub import_format: String,
    pub data: Value,
}

impl ImportRequest {
    pub fn openapi(data: Value) -> Self {
        Self { import_format: "openapi".to_string(), data }
    }
}

/// Status and raw body of an import response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends import requests to the remote service
#[async_trait]
pub trait ImportTransport: Send + Sync {
    async fn send(
        &self,
        url: &str,
        access_token: &str,
        api_version: &str,
        request: &ImportRequest,
    ) -> Result<TransportResponse>;
}

/// [`ImportTransport`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImportTransport for ReqwestTransport {
    async fn send(
        &self,
        url: &str,
        access_token: &str,
        api_version: &str,
        request: &ImportRequest,
    ) -> Result<TransportResponse> {
        debug!("POST {}", url);
        if tracing::enabled!(tracing::Level::TRACE) {
            let body = serde_json::to_string_pretty(request)
                .unwrap_or_else(|_| "<unable to serialize>".to_string());
            trace!("Import request body:\n{}", body);
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .header(API_VERSION_HEADER, api_version)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
