use axum::{
    extract::{Multipart, Path},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get, post},
    Form, Json, Router,
};
use tokio::net::TcpListener;
use tracing::debug;

/// A decoded form field as `[name, value]`.
pub type FieldPair = (String, String);

pub const GREETING: &str = "Hello world!";

pub fn app() -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/status/{code}", get(status))
        .route("/headers/{name}", get(header_value))
        .route("/form", post(echo_form))
        .route("/upload", post(echo_multipart))
        .route("/method", any(echo_method))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn hello() -> &'static str {
    GREETING
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn header_value(
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<String, StatusCode> {
    headers
        .get(name.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn echo_form(Form(fields): Form<Vec<FieldPair>>) -> Json<Vec<FieldPair>> {
    debug!(count = fields.len(), "decoded urlencoded form");
    Json(fields)
}

async fn echo_multipart(mut multipart: Multipart) -> Result<Json<Vec<FieldPair>>, StatusCode> {
    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        fields.push((name, value));
    }
    debug!(count = fields.len(), "decoded multipart form");
    Ok(Json(fields))
}

async fn echo_method(method: Method) -> String {
    method.to_string()
}
