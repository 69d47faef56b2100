//! Purpose: In-process contract tests for the ingress router.
//! Exports: None (integration test module).
//! Role: Drive `ingress::router` with `tower::ServiceExt::oneshot`; no sockets.
//! Invariants: Assertions target status codes and full JSON bodies.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower::ServiceExt;

use webhook_echo::ingress::{IngressConfig, ValidatedJson, router};

fn app() -> Router {
    router(&IngressConfig::default())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}

fn post_data(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/data")
        .body(body.into())
        .expect("request")
}

#[tokio::test]
async fn greeting_is_fixed() {
    let request = Request::builder()
        .uri("/?name=ignored&x=1")
        .header("x-custom", "whatever")
        .header(header::ACCEPT, "text/plain")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Hello, World!" }));
}

#[tokio::test]
async fn subscription_confirmation_is_echoed() {
    let payload = json!({ "Type": "SubscriptionConfirmation", "Token": "abc123" });
    let (status, body) = send(app(), post_data(payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "sns": "Received SNS message", "payload": payload })
    );
}

#[tokio::test]
async fn non_object_payloads_are_accepted() {
    for raw in ["[1,2,3]", "\"hello\"", "3.5", "null", "true"] {
        let (status, body) = send(app(), post_data(raw)).await;
        assert_eq!(status, StatusCode::OK, "payload {raw}");
        let expected: Value = serde_json::from_str(raw).expect("fixture");
        assert_eq!(body["payload"], expected);
        assert_eq!(body["sns"], "Received SNS message");
    }
}

#[tokio::test]
async fn content_type_is_not_enforced() {
    let request = Request::builder()
        .method("POST")
        .uri("/data")
        .header(header::CONTENT_TYPE, "text/plain; charset=UTF-8")
        .body(Body::from(r#"{"Type":"Notification","Message":"hi"}"#))
        .expect("request");
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payload"]["Message"], "hi");
}

#[tokio::test]
async fn echo_preserves_field_order() {
    let raw = r#"{"zeta":1,"alpha":{"b":2,"a":1},"mid":[3,2,1]}"#;
    let response = app().oneshot(post_data(raw)).await.expect("response");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(text.contains(&format!("\"payload\":{raw}")), "{text}");
}

#[tokio::test]
async fn malformed_json_reports_position() {
    let (status, body) = send(app(), post_data("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON");
    assert_eq!(body["detail"], "Request body is not valid JSON.");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert_eq!(body["position"]["line"], 1);
    assert!(body["position"]["column"].as_u64().is_some_and(|column| column >= 1));
}

#[tokio::test]
async fn multiline_failure_reports_decoder_line() {
    let (status, body) = send(app(), post_data("{\n  \"a\": 1,\n  \"b\": \n}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON");
    let line = body["position"]["line"].as_u64().expect("line");
    let column = body["position"]["column"].as_u64().expect("column");
    assert_eq!(line, 4);
    let message = body["message"].as_str().expect("message");
    assert!(message.ends_with(&format!("line {line} column {column}")));
}

#[tokio::test]
async fn empty_body_is_invalid_json() {
    let (status, body) = send(app(), post_data(Body::empty())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON");
    assert_eq!(body["detail"], "Request body is not valid JSON.");
    assert_eq!(body["position"]["line"], 1);
    let column = body["position"]["column"].as_u64().expect("column");
    assert!(column >= 1, "column is 1-based, got {column}");
}

#[tokio::test]
async fn oversized_body_is_bad_request() {
    let app = router(&IngressConfig { max_body_bytes: 16 });
    let (status, body) = send(app, post_data(format!("[{}]", "1,".repeat(64) + "1"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad request");
    assert_eq!(body["detail"], "Could not read request body.");
    assert!(body["message"].is_string());
    assert!(body.get("position").is_none());
}

#[tokio::test]
async fn broken_body_stream_is_bad_request() {
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"{\"Type\":")),
        Err(std::io::Error::other("connection reset")),
    ];
    let body = Body::from_stream(tokio_stream::iter(chunks));
    let (status, body) = send(app(), post_data(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad request");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let request = Request::builder()
        .uri("/nope")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Not Found" }));
}

#[derive(Debug, Deserialize, Serialize)]
struct SubscriptionConfirmation {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Token")]
    token: String,
}

async fn confirm(
    ValidatedJson(confirmation): ValidatedJson<SubscriptionConfirmation>,
) -> Json<SubscriptionConfirmation> {
    Json(confirmation)
}

fn schema_app() -> Router {
    app().merge(Router::new().route("/confirm", post(confirm)))
}

fn post_confirm(content_type: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/confirm");
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body)).expect("request")
}

#[tokio::test]
async fn schema_bound_route_binds_valid_body() {
    let request = post_confirm(
        Some("application/json"),
        r#"{"Type":"SubscriptionConfirmation","Token":"abc123"}"#,
    );
    let (status, body) = send(schema_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "Type": "SubscriptionConfirmation", "Token": "abc123" })
    );
}

#[tokio::test]
async fn schema_failures_use_validation_envelope() {
    let cases = [
        (Some("application/json"), r#"{"Type":"SubscriptionConfirmation"}"#, "json_data"),
        (Some("application/json"), r#"{"Type":"#, "json_invalid"),
        (None, r#"{"Type":"SubscriptionConfirmation","Token":"abc123"}"#, "content_type"),
    ];

    for (content_type, raw, kind) in cases {
        let (status, body) = send(schema_app(), post_confirm(content_type, raw)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "case {kind}");
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(
            body["detail"],
            "Request body could not be validated. Ensure Content-Type: application/json and the body is valid JSON (e.g. SNS subscription confirmation)."
        );
        let issues = body["validation_errors"].as_array().expect("issues");
        assert!(!issues.is_empty());
        assert_eq!(issues[0]["type"], kind);
        assert_eq!(issues[0]["loc"][0], "body");
        let expected_loc_len = if kind == "content_type" { 1 } else { 3 };
        assert_eq!(
            issues[0]["loc"].as_array().map(Vec::len),
            Some(expected_loc_len),
            "case {kind}"
        );
        assert!(issues[0]["msg"].is_string());
    }
}

#[tokio::test]
async fn schema_syntax_failure_locates_decoder_position() {
    let (status, body) = send(
        schema_app(),
        post_confirm(Some("application/json"), "{\n\"a\": }"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let issue = &body["validation_errors"][0];
    assert_eq!(issue["type"], "json_invalid");
    let line = issue["loc"][1].as_u64().expect("line");
    let column = issue["loc"][2].as_u64().expect("column");
    assert_eq!(line, 2);
    assert!(column >= 1);
    let msg = issue["msg"].as_str().expect("msg");
    assert!(msg.ends_with(&format!("line {line} column {column}")), "{msg}");
}
