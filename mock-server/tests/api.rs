use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, FieldPair, GREETING};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn form_request(uri: &str, content_type: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(body.to_string())
        .unwrap()
}

fn pairs(items: &[(&str, &str)]) -> Vec<FieldPair> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// --- root ---

#[tokio::test]
async fn root_says_hello() {
    let resp = app().oneshot(get("/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, GREETING.as_bytes());
}

// --- status ---

#[tokio::test]
async fn status_route_returns_requested_code() {
    let resp = app().oneshot(get("/status/404")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn status_route_rejects_non_numeric_code() {
    let resp = app().oneshot(get("/status/teapot")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- headers ---

#[tokio::test]
async fn headers_route_echoes_named_header() {
    let req = Request::builder()
        .uri("/headers/x-token")
        .header("X-Token", "abc123")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "abc123".as_bytes());
}

#[tokio::test]
async fn headers_route_missing_header_is_404() {
    let resp = app().oneshot(get("/headers/x-token")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- form ---

#[tokio::test]
async fn form_route_decodes_urlencoded_pairs() {
    let resp = app()
        .oneshot(form_request(
            "/form",
            "application/x-www-form-urlencoded",
            "a=1&a=2&b&greeting=hello%20world",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let fields: Vec<FieldPair> = body_json(resp).await;
    assert_eq!(
        fields,
        pairs(&[("a", "1"), ("a", "2"), ("b", ""), ("greeting", "hello world")])
    );
}

#[tokio::test]
async fn form_route_requires_form_content_type() {
    let resp = app()
        .oneshot(form_request("/form", "text/plain", "a=1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// --- upload ---

#[tokio::test]
async fn upload_route_decodes_multipart_parts() {
    let body = "--XYZ\r\n\
        Content-Disposition: form-data; name=\"a\"\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        1\r\n\
        --XYZ\r\n\
        Content-Disposition: form-data; name=\"a\"\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        2\r\n\
        --XYZ--\r\n";
    let resp = app()
        .oneshot(form_request(
            "/upload",
            "multipart/form-data; boundary=XYZ",
            body,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let fields: Vec<FieldPair> = body_json(resp).await;
    assert_eq!(fields, pairs(&[("a", "1"), ("a", "2")]));
}

#[tokio::test]
async fn upload_route_without_boundary_is_rejected() {
    let resp = app()
        .oneshot(form_request("/upload", "multipart/form-data", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- method ---

#[tokio::test]
async fn method_route_echoes_every_method() {
    for method in ["GET", "POST", "PUT", "DELETE", "PATCH"] {
        let req = Request::builder()
            .method(method)
            .uri("/method")
            .body(String::new())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK, "{method}");
        assert_eq!(body_bytes(resp).await, method.as_bytes(), "{method}");
    }
}
