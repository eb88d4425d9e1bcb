//! Request errors and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use transit_core::ScrapeError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing required parameters")]
    MissingParameters,

    #[error("{name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::MissingParameters => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: self.to_string(),
                    details: None,
                },
            ),
            AppError::InvalidParameter { .. } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid parameter".to_string(),
                    details: Some(self.to_string()),
                },
            ),
            AppError::Scrape(e) => {
                tracing::error!(error = %e, "Scrape request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        details: Some(e.to_string()),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
