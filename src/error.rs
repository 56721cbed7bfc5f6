use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::carrier::CarrierError;
use crate::payments::PaymentError;
use crate::ports::RepositoryError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    UpstreamUnavailable { status: StatusCode, message: String },

    #[error("Webhook Error: {0}")]
    InvalidSignature(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::UpstreamUnavailable { status, .. } => *status,
            AppError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => AppError::NotFound(what),
            RepositoryError::Conflict(message) => AppError::Internal(message),
            RepositoryError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<CarrierError> for AppError {
    fn from(err: CarrierError) -> Self {
        let status = match &err {
            CarrierError::ShippingUnavailable => StatusCode::NOT_FOUND,
            CarrierError::InvalidShippingResponse(_) => StatusCode::BAD_REQUEST,
            CarrierError::Request(_) | CarrierError::Upstream(_) | CarrierError::CircuitOpen => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError::UpstreamUnavailable {
            status,
            message: err.to_string(),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature(reason) => AppError::InvalidSignature(reason),
            PaymentError::InvalidEvent(reason) => AppError::BadRequest(format!("Webhook Error: {}", reason)),
            other => AppError::UpstreamUnavailable {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: other.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, self.to_string()).into_response()
    }
}
