//! # OpenAPI Generation
//!
//! Builds OpenAPI 3.1 documents, with ApiFox extensions, from captured
//! exchanges and the documentation metadata declared by tests.

pub mod document;
pub mod metadata;
pub mod parameters;

pub use document::{
    status_description, ApiOperation, DocumentBuilder, OpenApiDocument, ProjectInfo,
    OPENAPI_VERSION,
};
pub use metadata::{parse_annotations, Annotation, EndpointDoc};
pub use parameters::{handle_parameters, ParameterDescriptor, ParameterLocation};
