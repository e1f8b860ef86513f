//! # Document Push
//!
//! Sends captured OpenAPI documents to the ApiFox import API. Credentials
//! are checked before any network activity, so a misconfigured setup fails
//! without contacting the service.

pub mod transport;

pub use transport::{
    ImportRequest, ImportTransport, ReqwestTransport, TransportResponse, API_VERSION_HEADER,
};

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use crate::config::ApiFoxConfig;
use crate::errors::Result;
use crate::openapi::{EndpointDoc, OpenApiDocument};

/// Result of a push attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// The endpoint carries no name; nothing was sent
    Skipped,
    /// The service answered with `success: true`
    Imported { payload: Value },
    /// The service answered but did not report success
    Rejected { status: u16, payload: Value },
}

impl PushOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, PushOutcome::Imported { .. })
    }
}

/// Pushes documents using a configured transport
#[derive(Clone)]
pub struct ApiFoxPusher {
    config: Arc<ApiFoxConfig>,
    transport: Arc<dyn ImportTransport>,
}

impl std::fmt::Debug for ApiFoxPusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiFoxPusher").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ApiFoxPusher {
    /// Pusher with the HTTP transport
    pub fn new(config: Arc<ApiFoxConfig>) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: Arc<ApiFoxConfig>, transport: Arc<dyn ImportTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ApiFoxConfig {
        &self.config
    }

    /// Push the document of one endpoint. Undocumented endpoints are skipped.
    pub async fn push(&self, doc: &EndpointDoc, document: &OpenApiDocument) -> Result<PushOutcome> {
        if !doc.is_documented() {
            return Ok(PushOutcome::Skipped);
        }
        self.push_document(document.to_json()?).await
    }

    /// Push a serialized document
    pub async fn push_document(&self, document: Value) -> Result<PushOutcome> {
        let (project_id, access_token) = self.config.require_credentials()?;
        let url = self.config.import_url(project_id);
        let request = ImportRequest::openapi(document);

        let span = crate::push_span!(project_id, url);
        self.send_import(&url, access_token, &request).instrument(span).await
    }

    async fn send_import(
        &self,
        url: &str,
        access_token: &str,
        request: &ImportRequest,
    ) -> Result<PushOutcome> {
        let api_version = &self.config.api_version;
        let response = self.transport.send(url, access_token, api_version, request).await?;

        let payload = serde_json::from_str::<Value>(&response.body)
            .unwrap_or_else(|_| Value::String(response.body.clone()));

        if payload.get("success").and_then(Value::as_bool) == Some(true) {
            info!(status = response.status, "Imported API document");
            Ok(PushOutcome::Imported { payload })
        } else {
            warn!(
                status = response.status,
                response = %response.body,
                "ApiFox rejected API document"
            );
            Ok(PushOutcome::Rejected { status: response.status, payload })
        }
    }
}
