//! Axum middleware that documents requests made by the test suite.
//!
//! Install it with `route_layer` so the matched route template is known:
//!
//! ```rust,ignore
//! let state = ApiDocState::new(ApiFoxConfig::from_env()?)?;
//! let app = Router::new()
//!     .route("/users/{id}", get(show_user))
//!     .route_layer(axum::middleware::from_fn_with_state(state, capture_api_docs));
//! ```
//!
//! Tests mark a request for documentation by attaching an
//! [`EndpointDoc`] extension. Requests without one pass through untouched.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use tracing::{debug, error, warn, Instrument};

use super::{form, CapturedRequest, CapturedResponse, CONTENT_TYPE_MULTIPART};
use crate::config::ApiFoxConfig;
use crate::errors::{Error, Result};
use crate::openapi::{DocumentBuilder, EndpointDoc, ProjectInfo};
use crate::push::{ApiFoxPusher, PushOutcome};

/// Shared state of the capture middleware
#[derive(Clone, Debug)]
pub struct ApiDocState {
    config: Arc<ApiFoxConfig>,
    builder: Arc<DocumentBuilder>,
    pusher: ApiFoxPusher,
}

impl ApiDocState {
    /// State pushing over HTTP with the given configuration
    pub fn new(config: ApiFoxConfig) -> Result<Self> {
        let config = Arc::new(config);
        let pusher = ApiFoxPusher::new(config.clone())?;
        Ok(Self::with_pusher(pusher))
    }

    /// State around an existing pusher; the pusher's configuration is used
    pub fn with_pusher(pusher: ApiFoxPusher) -> Self {
        let config = Arc::new(pusher.config().clone());
        let builder = Arc::new(DocumentBuilder::new(ProjectInfo::from_config(&config)));
        Self { config, builder, pusher }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Middleware entry point that captures documented exchanges and pushes them.
///
/// Failures while documenting become a 500 response so the calling test
/// fails instead of silently producing no documentation.
pub async fn capture_api_docs(
    State(state): State<ApiDocState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.is_enabled() {
        return next.run(request).await;
    }

    let Some(doc) = request.extensions().get::<EndpointDoc>().cloned() else {
        return next.run(request).await;
    };
    if !doc.is_documented() {
        debug!(
            path = %request.uri().path(),
            "Endpoint has no documentation name; skipping capture"
        );
        return next.run(request).await;
    }

    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let span = crate::capture_span!(request.method(), route);

    match capture_exchange(&state, &doc, route, request, next).instrument(span).await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "Failed to document API exchange");
            err.into_response()
        }
    }
}

async fn capture_exchange(
    state: &ApiDocState,
    doc: &EndpointDoc,
    route: String,
    request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(|e| Error::validation(format!("Failed to read request body: {}", e)))?
        .to_bytes();

    let mut captured =
        CapturedRequest::new(parts.method.clone(), route).with_headers(parts.headers.clone());
    if let Some(query) = parts.uri.query() {
        captured = captured.with_query_string(query);
    }
    let decoded = if captured.content_type.as_deref() == Some(CONTENT_TYPE_MULTIPART) {
        form::parse_multipart(&parts.headers, bytes.clone())
            .await
            .map(|body| CapturedRequest { body, ..captured.clone() })
    } else {
        captured.clone().with_raw_body(&bytes)
    };
    let captured = match decoded {
        Ok(captured) => captured,
        Err(err) => {
            warn!(error = %err, "Request body could not be decoded; documenting it as raw text");
            let raw_body = Some(String::from_utf8_lossy(&bytes).into_owned());
            CapturedRequest { raw_body, ..captured }
        }
    };

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let (parts, body) = response.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(|e| Error::internal(format!("Failed to read response body: {}", e)))?
        .to_bytes();
    let captured_response = CapturedResponse::from_parts(parts.status, &parts.headers, &bytes);
    let response = Response::from_parts(parts, Body::from(bytes));

    let document = state.builder.build(doc, &captured, &captured_response);
    match state.pusher.push(doc, &document).await? {
        PushOutcome::Imported { .. } => debug!(route = %captured.path(), "Documented endpoint"),
        PushOutcome::Rejected { status, .. } => {
            debug!(route = %captured.path(), status, "Endpoint documentation was not accepted")
        }
        PushOutcome::Skipped => {}
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::{ImportRequest, ImportTransport, TransportResponse};
    use async_trait::async_trait;
    use axum::{
        extract::{Multipart, Path},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<ImportRequest>>,
    }

    #[async_trait]
    impl ImportTransport for RecordingTransport {
        async fn send(
            &self,
            _url: &str,
            _access_token: &str,
            _api_version: &str,
            request: &ImportRequest,
        ) -> Result<TransportResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(TransportResponse { status: 200, body: r#"{"success":true}"#.to_string() })
        }
    }

    async fn update_user(Path(id): Path<u32>, Json(body): Json<Value>) -> Json<Value> {
        Json(json!({"id": id, "name": body["name"]}))
    }

    async fn ping() -> &'static str {
        "pong"
    }

    async fn upload(mut multipart: Multipart) -> StatusCode {
        match multipart.next_field().await {
            Ok(_) => StatusCode::CREATED,
            Err(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn app(config: ApiFoxConfig, transport: Arc<RecordingTransport>) -> Router {
        let pusher = ApiFoxPusher::with_transport(Arc::new(config), transport);
        let state = ApiDocState::with_pusher(pusher);
        Router::new()
            .route("/users/{id}", post(update_user))
            .route("/ping", get(ping))
            .route("/uploads", post(upload))
            .route_layer(axum::middleware::from_fn_with_state(state, capture_api_docs))
    }

    fn update_request(doc: Option<EndpointDoc>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/users/5?notify=yes")
            .header("content-type", "application/json");
        if let Some(doc) = doc {
            builder = builder.extension(doc);
        }
        builder.body(Body::from(r#"{"name":"Ada"}"#)).unwrap()
    }

    #[tokio::test]
    async fn test_documented_request_is_pushed() {
        let transport = Arc::new(RecordingTransport::default());
        let app = app(ApiFoxConfig::new("1", "t"), transport.clone());

        let response = app
            .oneshot(update_request(Some(EndpointDoc::new("Update user").folder("Users"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"id": 5, "name": "Ada"}));

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let operation = &requests[0].data["paths"]["/users/{id}"]["post"];
        assert_eq!(operation["summary"], "Update user");
        assert_eq!(operation["parameters"][0]["name"], "id");
        assert_eq!(operation["parameters"][1]["name"], "notify");
        let schema = &operation["requestBody"]["content"]["application/json"]["schema"];
        assert_eq!(schema["properties"]["name"]["type"], json!(["string", "null"]));
        assert_eq!(
            operation["responses"]["200"]["content"]["application/json"]["examples"]["1"]["value"],
            json!({"id": 5, "name": "Ada"})
        );
    }

    #[tokio::test]
    async fn test_disabled_middleware_passes_through() {
        let transport = Arc::new(RecordingTransport::default());
        let app = app(ApiFoxConfig::new("1", "t").with_enabled(false), transport.clone());

        let request = update_request(Some(EndpointDoc::new("Update user")));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_without_doc_passes_through() {
        let transport = Arc::new(RecordingTransport::default());
        let app = app(ApiFoxConfig::new("1", "t"), transport.clone());

        let response = app.oneshot(update_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_the_request() {
        let transport = Arc::new(RecordingTransport::default());
        let config = ApiFoxConfig { access_token: None, ..ApiFoxConfig::new("1", "t") };
        let app = app(config, transport.clone());

        let request = Request::builder()
            .uri("/ping")
            .extension(EndpointDoc::new("Ping"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "configuration_error");
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_multipart_reaches_the_handler() {
        let transport = Arc::new(RecordingTransport::default());
        let app = app(ApiFoxConfig::new("1", "t"), transport.clone());

        let request = Request::builder()
            .method("POST")
            .uri("/uploads")
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .extension(EndpointDoc::new("Upload"))
            .body(Body::from("not a multipart body"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].data["paths"]["/uploads"]["post"]["responses"]["400"].is_object());
    }
}
