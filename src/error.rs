//! Error taxonomy shared by the collection pipeline and the query side.

use axum::http::StatusCode;
use sea_orm::DbErr;

/// Errors raised by adapters, the normalizer, the store and the query service
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    /// Adapter-level failure, the run skips the source
    #[error("Source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },
    /// Record-level failure, the run skips the observation
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Discount {0} not found")]
    NotFound(i32),
    #[error("Storage failure: {0}")]
    Storage(#[from] DbErr),
}

impl AggregatorError {
    pub fn source_unavailable(source_name: &str, reason: impl ToString) -> Self {
        AggregatorError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status the presentation layer answers with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AggregatorError::SourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AggregatorError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AggregatorError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            AggregatorError::NotFound(_) => StatusCode::NOT_FOUND,
            AggregatorError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T, E = AggregatorError> = std::result::Result<T, E>;
