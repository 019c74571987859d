//! HTTP surface of the tech adapter
//!
//! Routes follow the provisioner API: synchronous provision/unprovision and
//! validate, plus placeholders for the asynchronous status endpoints.

mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::services::provision::ProvisionService;

pub use error::ApiError;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn ProvisionService>,
}

impl AppState {
    pub fn new(service: Arc<dyn ProvisionService>) -> Self {
        Self { service }
    }
}

/// Build the full router with logging middleware and request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/provision", post(handlers::provision))
        .route("/v1/provision/:token/status", get(handlers::get_status))
        .route("/v1/unprovision", post(handlers::unprovision))
        .route("/v1/updateacl", post(handlers::update_acl))
        .route("/v1/validate", post(handlers::validate))
        .route("/v2/validate", post(handlers::async_validate))
        .route(
            "/v2/validate/:token/status",
            get(handlers::get_validation_status),
        )
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_mw::from_fn(middleware::log_request_response)),
        )
        .with_state(state)
}
