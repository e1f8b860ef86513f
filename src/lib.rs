//! # apifox-capture
//!
//! Documents an axum service from its own test suite. A middleware records
//! each request a test marks with an [`EndpointDoc`], infers JSON Schemas
//! for the request and response bodies, and imports the resulting OpenAPI
//! 3.1 document into an ApiFox project.
//!
//! ```text
//! test request → capture middleware → CapturedRequest / CapturedResponse
//!                                         ↓
//!                     SchemaInferenceEngine → OpenApiDocument → ApiFoxPusher
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use apifox_capture::{capture_api_docs, ApiDocState, ApiFoxConfig, EndpointDoc};
//! use axum::{body::Body, http::Request, routing::get, Router};
//! use tower::ServiceExt;
//!
//! # async fn example() -> apifox_capture::Result<()> {
//! let state = ApiDocState::new(ApiFoxConfig::from_env()?)?;
//! let app = Router::new()
//!     .route("/users/{id}", get(|| async { "ok" }))
//!     .route_layer(axum::middleware::from_fn_with_state(state, capture_api_docs));
//!
//! let request = Request::builder()
//!     .uri("/users/1")
//!     .extension(EndpointDoc::new("Show user").folder("Users"))
//!     .body(Body::empty())
//!     .expect("valid request");
//! let _response = app.oneshot(request).await;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod openapi;
pub mod push;
pub mod schema;

// Re-export commonly used types and traits
pub use capture::{capture_api_docs, ApiDocState, CapturedRequest, CapturedResponse};
pub use config::{ApiFoxConfig, ObservabilityConfig};
pub use errors::{Error, Result};
pub use openapi::{DocumentBuilder, EndpointDoc, OpenApiDocument};
pub use push::{ApiFoxPusher, PushOutcome};
pub use schema::{AttributeLabels, RuleSet, RuntimeValue, SchemaInferenceEngine, SchemaNode};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
