//! End-to-end tests of the capture middleware against a mock import service

mod common;

use apifox_capture::schema::{AttributeLabels, RuleSet};
use apifox_capture::{capture_api_docs, ApiDocState, ApiFoxConfig, EndpointDoc};
use axum::{
    body::Body,
    extract::{Multipart, Path},
    http::{header, Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::mocks::MockApiFox;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn create_order(Path(_shop): Path<String>, Json(_body): Json<Value>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({"id": 7, "items": [{"sku": "A1", "qty": 2}]})))
}

async fn login(body: String) -> StatusCode {
    if body.starts_with("email=") {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::BAD_REQUEST
    }
}

async fn upload_avatar(mut multipart: Multipart) -> Json<Value> {
    let mut stored = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        if let Some(file_name) = field.file_name() {
            stored.push(file_name.to_string());
        }
    }
    Json(json!({"stored": stored}))
}

async fn store_attachment(mut multipart: Multipart) -> StatusCode {
    match multipart.next_field().await {
        Ok(_) => StatusCode::CREATED,
        Err(_) => StatusCode::BAD_REQUEST,
    }
}

async fn download_report(Path(_id): Path<u32>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"report.csv\""),
        ],
        "day,total\nmon,3\n",
    )
}

fn app(config: ApiFoxConfig) -> Router {
    let state = ApiDocState::new(config).expect("state builds");
    Router::new()
        .route("/shops/{shop}/orders", post(create_order))
        .route("/login", post(login))
        .route("/avatars", post(upload_avatar))
        .route("/attachments", post(store_attachment))
        .route("/reports/{id}", get(download_report))
        .route_layer(axum::middleware::from_fn_with_state(state, capture_api_docs))
}

fn order_doc() -> EndpointDoc {
    EndpointDoc::new("Create order")
        .folder("Shop/Orders")
        .description("Places an order")
        .rules(
            RuleSet::new()
                .with_rule("customer", "required|string")
                .with_rule("coupon", "string")
                .with_rule("items", "required|array"),
        )
        .attributes(AttributeLabels::new().with_label("customer", "Customer name"))
}

fn order_request(doc: EndpointDoc) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/shops/berlin/orders?dry_run=0")
        .header(header::CONTENT_TYPE, "application/json")
        .extension(doc)
        .body(Body::from(r#"{"customer":"Ada","items":[{"sku":"A1","qty":2}]}"#))
        .unwrap()
}

#[tokio::test]
async fn json_request_is_documented_and_imported() {
    let apifox = MockApiFox::start_accepting().await;

    let response = app(apifox.config()).oneshot(order_request(order_doc())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap()["id"], 7);

    let document = apifox.single_document().await;
    assert_eq!(document["openapi"], "3.1.0");
    assert_eq!(document["info"], json!({"title": "Shop", "description": "", "version": "1.0.0"}));
    assert_eq!(document["tags"], json!([{"name": "Shop"}, {"name": "Shop/Orders"}]));

    let operation = &document["paths"]["/shops/{shop}/orders"]["post"];
    assert_eq!(operation["summary"], "Create order");
    assert_eq!(operation["description"], "Places an order");
    assert_eq!(operation["x-apifox-folder"], "Shop/Orders");
    assert_eq!(operation["x-apifox-status"], "pending");
    assert_eq!(operation["tags"], json!(["Shop/Orders"]));
    assert_eq!(operation["deprecated"], false);

    let parameters = operation["parameters"].as_array().unwrap();
    assert_eq!(parameters.len(), 2);
    assert_eq!(parameters[0]["name"], "shop");
    assert_eq!(parameters[0]["in"], "path");
    assert_eq!(parameters[1], json!({
        "name": "dry_run",
        "in": "query",
        "description": "",
        "required": true,
        "example": "0",
        "schema": {"type": "string"}
    }));

    let request_content = &operation["requestBody"]["content"]["application/json"];
    let schema = &request_content["schema"];
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["required"], json!(["customer", "items"]));
    assert_eq!(schema["x-apifox-orders"], json!(["customer", "coupon", "items"]));
    assert_eq!(schema["properties"]["customer"]["type"], "string");
    assert_eq!(schema["properties"]["customer"]["title"], "Customer name");
    assert_eq!(schema["properties"]["coupon"]["type"], json!(["string", "null"]));
    assert_eq!(schema["properties"]["items"]["type"], "array");
    assert_eq!(schema["properties"]["items"]["items"]["type"], "object");
    assert_eq!(
        schema["properties"]["items"]["items"]["properties"]["qty"]["type"],
        json!(["number", "null"])
    );
    assert_eq!(
        request_content["example"],
        json!({"customer": "Ada", "items": [{"sku": "A1", "qty": 2}]})
    );

    let created = &operation["responses"]["201"];
    assert_eq!(created["description"], "Created");
    let response_content = &created["content"]["application/json"];
    assert_eq!(response_content["schema"]["properties"]["id"]["type"], json!(["number", "null"]));
    assert_eq!(response_content["examples"]["1"]["summary"], "Example");
    assert_eq!(response_content["examples"]["1"]["value"]["items"][0]["sku"], "A1");
}

#[tokio::test]
async fn form_request_with_empty_response() {
    let apifox = MockApiFox::start_accepting().await;

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .extension(EndpointDoc::new("Log in"))
        .body(Body::from("email=ada%40example.com&roles[]=admin&roles[]=dev"))
        .unwrap();
    let response = app(apifox.config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let document = apifox.single_document().await;
    assert_eq!(document["tags"], json!([]));
    let operation = &document["paths"]["/login"]["post"];
    assert_eq!(operation["tags"], json!([]));

    let content = &operation["requestBody"]["content"]["application/x-www-form-urlencoded"];
    assert_eq!(content["schema"]["properties"]["email"]["type"], json!(["string", "null"]));
    assert_eq!(content["schema"]["properties"]["roles"]["type"], json!(["array", "null"]));
    assert_eq!(content["schema"]["properties"]["roles"]["items"]["type"], "string");
    assert_eq!(content["example"], "email=ada%40example.com&roles[]=admin&roles[]=dev");

    let no_content = &operation["responses"]["204"];
    assert_eq!(no_content["description"], "No Content");
    let octet = &no_content["content"]["application/octet-stream"];
    assert_eq!(octet["schema"]["type"], "object");
    assert!(octet.get("examples").is_none());
}

#[tokio::test]
async fn multipart_upload_is_documented_as_binary() {
    let apifox = MockApiFox::start_accepting().await;

    let boundary = "AVATARBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\nMe\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"me.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/avatars")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .extension(EndpointDoc::new("Upload avatar").folder("Users"))
        .body(Body::from(body))
        .unwrap();
    let response = app(apifox.config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"stored": ["me.png"]}));

    let document = apifox.single_document().await;
    let request_body = &document["paths"]["/avatars"]["post"]["requestBody"];
    let content = &request_body["content"]["multipart/form-data"];
    assert_eq!(
        content["schema"]["properties"]["avatar"],
        json!({"type": "string", "format": "binary", "description": "file"})
    );
    assert_eq!(content["schema"]["properties"]["caption"]["type"], json!(["string", "null"]));
    assert!(content.get("example").is_none());
}

#[tokio::test]
async fn malformed_multipart_keeps_the_handler_status() {
    let apifox = MockApiFox::start_accepting().await;

    let request = Request::builder()
        .method("POST")
        .uri("/attachments")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XB")
        .extension(EndpointDoc::new("Store attachment"))
        .body(Body::from("garbage without boundary"))
        .unwrap();
    let response = app(apifox.config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let document = apifox.single_document().await;
    let operation = &document["paths"]["/attachments"]["post"];
    assert_eq!(operation["summary"], "Store attachment");
    assert!(operation["responses"]["400"].is_object());
}

#[tokio::test]
async fn download_with_header_parameters() {
    let apifox = MockApiFox::start_accepting().await;

    let doc = EndpointDoc::from_annotations(
        r#"
        /**
         * @apifox.name Download report
         * @apifox.tags Reports
         * @apifox.deprecated
         * @apifox.withHeaders
         */
        "#,
    );
    let request = Request::builder()
        .uri("/reports/12")
        .header("x-trace-id", "abc")
        .extension(doc)
        .body(Body::empty())
        .unwrap();
    let response = app(apifox.config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"day,total\nmon,3\n");

    let document = apifox.single_document().await;
    let operation = &document["paths"]["/reports/{id}"]["get"];
    assert_eq!(operation["deprecated"], true);
    assert!(operation.get("requestBody").is_none());

    let parameters = operation["parameters"].as_array().unwrap();
    assert_eq!(parameters[0]["name"], "x-trace-id");
    assert_eq!(parameters[0]["in"], "header");
    assert_eq!(parameters[0]["example"], "abc");
    assert_eq!(parameters[1]["name"], "id");
    assert_eq!(parameters[1]["in"], "path");

    let ok = &operation["responses"]["200"];
    assert_eq!(ok["description"], "Success");
    assert!(ok["content"]["application/octet-stream"].get("examples").is_none());
}

#[tokio::test]
async fn rejected_import_does_not_fail_the_request() {
    let apifox =
        MockApiFox::start_replying(200, json!({"success": false, "errorMessage": "quota"})).await;

    let response = app(apifox.config()).oneshot(order_request(order_doc())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(apifox.imports().await.len(), 1);
}

#[tokio::test]
async fn missing_credentials_fail_before_any_import() {
    let apifox = MockApiFox::start_accepting().await;
    let config = ApiFoxConfig { project_id: None, ..apifox.config() };

    let response = app(config).oneshot(order_request(order_doc())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "configuration_error");
    assert!(body["message"].as_str().unwrap().contains("project ID"));

    assert!(apifox.imports().await.is_empty());
}

#[tokio::test]
async fn disabled_capture_and_undocumented_requests_pass_through() {
    let apifox = MockApiFox::start_accepting().await;

    let disabled = app(apifox.config().with_enabled(false));
    let response = disabled.oneshot(order_request(order_doc())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let enabled = app(apifox.config());
    let response = enabled.oneshot(order_request(EndpointDoc::default())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    assert!(apifox.imports().await.is_empty());
}
