use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::sync::SyncError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No provider credential bound")]
    CredentialMissing,

    #[error("Provider rejected the credential")]
    CredentialRejected,

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SyncError> for AppError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::NotFound(id) => AppError::NotFound(format!("Repository {id} not found")),
            SyncError::CredentialMissing => AppError::CredentialMissing,
            SyncError::CredentialRejected => AppError::CredentialRejected,
            e @ SyncError::ProviderUnavailable { .. } => {
                AppError::ProviderUnavailable(e.to_string())
            }
            SyncError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::CredentialMissing => (
                StatusCode::PRECONDITION_FAILED,
                "CREDENTIAL_MISSING",
                "Connect a GitHub account before syncing".to_string(),
            ),
            AppError::CredentialRejected => (
                StatusCode::UNAUTHORIZED,
                "CREDENTIAL_REJECTED",
                "GitHub rejected the stored credential".to_string(),
            ),
            AppError::ProviderUnavailable(reason) => {
                tracing::warn!("Provider unavailable: {reason}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PROVIDER_UNAVAILABLE",
                    "GitHub is unavailable, try again later".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderFailure;
    use uuid::Uuid;

    #[test]
    fn test_sync_error_status_mapping() {
        let cases = [
            (SyncError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (SyncError::CredentialMissing, StatusCode::PRECONDITION_FAILED),
            (SyncError::CredentialRejected, StatusCode::UNAUTHORIZED),
            (
                SyncError::ProviderUnavailable {
                    step: "listing commits",
                    reason: ProviderFailure::Transport("connection reset".to_string()),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
