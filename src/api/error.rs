use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use crate::models::api::{SystemErr, ValidationError};

/// Failure outcome of a handler: caller defect (400) or backend failure (500)
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    System(SystemErr),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<SystemErr> for ApiError {
    fn from(err: SystemErr) -> Self {
        Self::System(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(err) => (StatusCode::BAD_REQUEST, Json(err)).into_response(),
            Self::System(err) => {
                error!("System error: {}", err.error);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(err)).into_response()
            }
        }
    }
}
