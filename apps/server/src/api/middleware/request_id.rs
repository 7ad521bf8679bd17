//! Request ID middleware
//!
//! Creates a root span for each HTTP request, assigns a server request
//! id, and echoes it back in the `x-request-id` response header.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Span;
use uuid::Uuid;

#[tracing::instrument(
    name = "http_request",
    skip_all,
    fields(
        http.method = %req.method(),
        http.route = %req.uri().path(),
        http.response.status_code = tracing::field::Empty,
        request_id = tracing::field::Empty,
    )
)]
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let span = Span::current();
    let start = Instant::now();

    let request_id = Uuid::new_v4().to_string();
    span.record("request_id", request_id.as_str());

    let mut response = next.run(req).await;
    span.record("http.response.status_code", response.status().as_u16());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    tracing::debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}
