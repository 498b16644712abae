//! HTTP error mapping for the signup API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use uuid::Uuid;

use crate::error::FlowError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error(transparent)]
    Flow(#[from] FlowError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Flow(FlowError::ConsentRequired) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Flow(FlowError::UnknownField { .. }) => StatusCode::BAD_REQUEST,
            AppError::Flow(
                FlowError::SubmissionInFlight
                | FlowError::TerminalStep { .. }
                | FlowError::BackNotAllowed { .. }
                | FlowError::UnexpectedReply,
            ) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}
