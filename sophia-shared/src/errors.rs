use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::{ApiErrorResponse, FieldError};

/// Application error codes following the pattern E{domain}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: Business errors
/// - E3xxx: Analytics errors
/// - E4xxx: Monitoring errors
/// - E5xxx: Campaign errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,
    ProviderUnavailable,

    // Auth (E1xxx)
    InvalidCredentials,
    EmailAlreadyExists,
    TokenExpired,
    TokenInvalid,
    RefreshTokenRevoked,
    PasswordTooWeak,

    // Business (E2xxx)
    BusinessNotFound,
    BusinessNameTaken,
    NotBusinessOwner,
    InvalidBusinessStatus,
    MissingWebsiteUrl,

    // Analytics (E3xxx)
    TrackingNotConfigured,
    TrackingAlreadyConfigured,
    UnknownMetric,

    // Campaigns (E5xxx)
    CampaignNotFound,
    InvalidCampaignStatus,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0006",
            Self::ProviderUnavailable => "E0007",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::EmailAlreadyExists => "E1002",
            Self::TokenExpired => "E1003",
            Self::TokenInvalid => "E1004",
            Self::RefreshTokenRevoked => "E1005",
            Self::PasswordTooWeak => "E1006",

            // Business
            Self::BusinessNotFound => "E2001",
            Self::BusinessNameTaken => "E2002",
            Self::NotBusinessOwner => "E2003",
            Self::InvalidBusinessStatus => "E2004",
            Self::MissingWebsiteUrl => "E2005",

            // Analytics
            Self::TrackingNotConfigured => "E3001",
            Self::TrackingAlreadyConfigured => "E3002",
            Self::UnknownMetric => "E3003",

            // Campaigns
            Self::CampaignNotFound => "E5001",
            Self::InvalidCampaignStatus => "E5002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ProviderUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::PasswordTooWeak
            | Self::InvalidBusinessStatus | Self::InvalidCampaignStatus
            | Self::TrackingNotConfigured | Self::UnknownMetric
            | Self::MissingWebsiteUrl => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::BusinessNotFound | Self::CampaignNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::TokenExpired
            | Self::TokenInvalid | Self::RefreshTokenRevoked => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::NotBusinessOwner => StatusCode::FORBIDDEN,
            Self::EmailAlreadyExists | Self::BusinessNameTaken
            | Self::TrackingAlreadyConfigured => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
    },

    #[error("validation failed")]
    Validation { errors: Vec<FieldError> },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Convert `validator` derive failures into a field-level error list.
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        Self::Validation { errors: fields }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message } => {
                (code.status_code(), ApiErrorResponse::new(code.code(), message))
            }
            AppError::Validation { errors } => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new(ErrorCode::ValidationError.code(), "validation failed")
                    .with_field_errors(errors.clone()),
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_mismatch_is_forbidden_not_missing() {
        assert_eq!(ErrorCode::NotBusinessOwner.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::BusinessNotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicates_conflict() {
        assert_eq!(ErrorCode::BusinessNameTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::EmailAlreadyExists.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn unconfigured_tracking_is_a_bad_request() {
        assert_eq!(ErrorCode::TrackingNotConfigured.status_code(), StatusCode::BAD_REQUEST);
    }
}
