//! Request/response body logging
//!
//! Both bodies are buffered so they can be logged under one correlation id,
//! then handed on unchanged. Buffering is capped at [`MAX_BODY_BYTES`], the
//! same limit axum's `Json` extractor applies by default.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};
use uuid::Uuid;

pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub async fn log_request_response(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let request_body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let response = next
        .run(Request::from_parts(parts, Body::from(request_body.clone())))
        .await;

    let (parts, body) = response.into_parts();
    let response_body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read response body: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let id = Uuid::new_v4();
    info!("[{}] REQUEST: {}", id, String::from_utf8_lossy(&request_body));
    info!("[{}] RESPONSE: {}", id, String::from_utf8_lossy(&response_body));

    Response::from_parts(parts, Body::from(response_body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware as axum_mw, routing::post, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn echo_app() -> Router {
        Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(axum_mw::from_fn(log_request_response))
    }

    fn post_body(body: Vec<u8>) -> Request {
        Request::builder()
            .method("POST")
            .uri("/echo")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_bodies_pass_through_unchanged() {
        let response = echo_app()
            .oneshot(post_body(b"hello".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_oversized_request_body_is_rejected() {
        let response = echo_app()
            .oneshot(post_body(vec![b'a'; MAX_BODY_BYTES + 1]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
