use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

/// Rejection reasons for an add-product draft. Returned to the caller so
/// the view layer can decide how to present them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("product name must not be empty")]
    EmptyName,

    #[error("product category must not be empty")]
    EmptyCategory,

    #[error("price is not a number: {0:?}")]
    InvalidPrice(String),

    #[error("target CPA is not a number: {0:?}")]
    InvalidTargetCpa(String),

    #[error("price must be non-negative")]
    NegativePrice,

    #[error("target CPA must be non-negative")]
    NegativeTargetCpa,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid product: {0}")]
    Product(#[from] ProductError),

    #[error("unknown theme {0:?} (expected \"dark\" or \"light\")")]
    Theme(String),

    #[error("no product with id {0:?}")]
    ProductNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Product(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Theme(_) => StatusCode::BAD_REQUEST,
            AppError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
