// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::db::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("You have already joined this challenge!")]
    AlreadyJoined,

    #[error("You are already registered for this event.")]
    AlreadyRegistered,

    #[error("This event has reached maximum capacity.")]
    EventFull,

    #[error("You need {shortfall} more FitCoins to redeem this reward.")]
    InsufficientFitCoins { shortfall: u64 },

    #[error("Workout already credited today")]
    WorkoutAlreadyCredited,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = Some(self.to_string());
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", details)
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::EmailTaken => (StatusCode::CONFLICT, "email_taken", details),
            AppError::AlreadyJoined => (StatusCode::CONFLICT, "already_joined", details),
            AppError::AlreadyRegistered => (StatusCode::CONFLICT, "already_registered", details),
            AppError::EventFull => (StatusCode::CONFLICT, "event_full", details),
            AppError::InsufficientFitCoins { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_fitcoins",
                details,
            ),
            AppError::WorkoutAlreadyCredited => {
                (StatusCode::CONFLICT, "workout_already_credited", details)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Store failures that no flow translated into a domain error.
///
/// Flows match on the named store kinds they expect (duplicates, capacity,
/// balance) before falling back to this conversion.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what.to_string()),
            StoreError::AlreadyExists(what) => {
                AppError::BadRequest(format!("{} already exists", what))
            }
            StoreError::CapacityReached => AppError::EventFull,
            StoreError::InsufficientBalance { balance, cost } => AppError::InsufficientFitCoins {
                shortfall: cost.saturating_sub(balance),
            },
            StoreError::AlreadyCredited(_) => AppError::WorkoutAlreadyCredited,
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortfall_message() {
        let err = AppError::InsufficientFitCoins { shortfall: 10 };
        assert_eq!(
            err.to_string(),
            "You need 10 more FitCoins to redeem this reward."
        );
    }

    #[test]
    fn test_store_balance_error_maps_to_shortfall() {
        let err: AppError = StoreError::InsufficientBalance {
            balance: 40,
            cost: 50,
        }
        .into();
        assert!(matches!(
            err,
            AppError::InsufficientFitCoins { shortfall: 10 }
        ));
    }

    #[test]
    fn test_backend_error_is_generic_500() {
        let response = AppError::from(StoreError::Backend("boom".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_duplicate_join_is_conflict() {
        let response = AppError::AlreadyJoined.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
