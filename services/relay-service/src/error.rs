use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Webflow API Error: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON in CMS response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot build CMS url: {0}")]
    UpstreamUrl(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidBody(_) | RelayError::MissingFields(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Transport(_) | RelayError::Decode(_) | RelayError::UpstreamUrl(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn is_client_error(&self) -> bool {
        matches!(self, RelayError::InvalidBody(_) | RelayError::MissingFields(_))
    }
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        RelayError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_client_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "create item rejected");
        } else {
            tracing::error!(status = status.as_u16(), error = %self, "create item failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
