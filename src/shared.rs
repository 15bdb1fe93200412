use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::room::RoomService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    /// Interval between SSE keep-alive comments
    pub keep_alive: Duration,
}

impl AppState {
    pub fn new(room_service: Arc<RoomService>, keep_alive: Duration) -> Self {
        Self {
            room_service,
            keep_alive,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidState(msg) => msg,
            AppError::Internal => "Internal server error".to_string(),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
