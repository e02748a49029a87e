//! HTTP API for the practice portal
//!
//! This module provides a REST API for the student and admin frontends:
//! - GET  /speaking/tests, /writing/tasks, /listening/tests, /reading/tests - Browse content
//! - POST /speaking/sessions - Create a guided speaking session
//! - POST /speaking/sessions/:id/{start,prepare,record,stop,next,discard} - Drive a session
//! - POST /speaking/submissions, /writing/submissions - Submit answers for evaluation
//! - POST /admin/* - Content management (PIN protected)
//! - GET  /health - Health check

mod admin;
mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::error::PortalError;

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = match &self {
            PortalError::ValidationFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Session(_) | PortalError::DeviceUnavailable(_) => StatusCode::CONFLICT,
            PortalError::UploadFailure(_) | PortalError::EvaluatorFailure(_) => {
                StatusCode::BAD_GATEWAY
            }
            PortalError::Unauthorized => StatusCode::UNAUTHORIZED,
            PortalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}
