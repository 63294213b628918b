use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::{
        ValidationError,
        cart::CartError,
        order::OrderError,
    },
    payment::PaymentError,
    response::ApiResponse,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    #[error("Database error")]
    OrmError(#[from] DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::OrmError(err) if is_unique_violation(err) => StatusCode::CONFLICT,
            AppError::Upstream(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.message)
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ItemNotInCart => AppError::NotFound(err.to_string()),
            CartError::InvalidQuantity
            | CartError::InsufficientStock { .. }
            | CartError::TotalOverflow => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NoCartExists => AppError::NotFound(err.to_string()),
            OrderError::EmptyCart | OrderError::InvalidStatus | OrderError::TotalOverflow => {
                AppError::BadRequest(err.to_string())
            }
            OrderError::AlreadyCancelled | OrderError::CancellationWindowClosed => {
                AppError::Conflict(err.to_string())
            }
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidAmount => AppError::BadRequest(err.to_string()),
            PaymentError::NotConfigured | PaymentError::Network(_) | PaymentError::Provider { .. } => {
                tracing::error!(error = %err, "payment gateway call failed");
                AppError::Upstream("Failed to create payment order".into())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::OrmError(err) if is_unique_violation(err) => {
                "Resource already exists".to_string()
            }
            AppError::OrmError(err) => {
                tracing::error!(error = %err, "database error");
                self.to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "unhandled error");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = ApiResponse::<ErrorData>::failure(
            message.clone(),
            ErrorData { error: message },
        );

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
