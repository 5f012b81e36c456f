//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::db::DatabaseError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid or expired verification code")]
    InvalidCredential,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Session active on another device")]
    SessionSuperseded,
    #[error("Phone number already registered")]
    AlreadyRegistered,
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIAL",
                "Invalid or expired verification code".to_string(),
            ),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::SessionSuperseded => (
                StatusCode::UNAUTHORIZED,
                "SESSION_SUPERSEDED",
                "Session active on another device, log in again".to_string(),
            ),
            ApiError::AlreadyRegistered => (
                StatusCode::BAD_REQUEST,
                "ALREADY_REGISTERED",
                "Phone number already registered".to_string(),
            ),
            ApiError::InvalidStatus(value) => (
                StatusCode::BAD_REQUEST,
                "INVALID_STATUS",
                format!("Invalid status: {value}"),
            ),
            ApiError::NotFound(detail) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                detail.clone(),
            ),
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                detail.clone(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential => ApiError::InvalidCredential,
            AuthError::Unauthenticated => ApiError::Unauthenticated,
            AuthError::SessionSuperseded => ApiError::SessionSuperseded,
            AuthError::Encoding(e) => ApiError::Internal(e),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn unauthenticated_returns_401() {
        let response = ApiError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn invalid_credential_returns_401() {
        let response = ApiError::InvalidCredential.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "INVALID_CREDENTIAL");
    }

    #[tokio::test]
    async fn session_superseded_returns_401() {
        let response = ApiError::SessionSuperseded.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "SESSION_SUPERSEDED");
    }

    #[tokio::test]
    async fn already_registered_returns_400() {
        let response = ApiError::AlreadyRegistered.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "ALREADY_REGISTERED");
    }

    #[tokio::test]
    async fn invalid_status_returns_400_with_value() {
        let response = ApiError::InvalidStatus("critical".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "INVALID_STATUS");
        assert!(json["error"]["message"].as_str().unwrap().contains("critical"));
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let response = ApiError::NotFound("User not found. Please register.".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_returns_500_and_hides_detail() {
        let response = ApiError::Internal("db exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        // Internal errors hide details from the client
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn auth_error_maps_to_matching_status() {
        let api_err: ApiError = AuthError::SessionSuperseded.into();
        assert_eq!(api_err.into_response().status(), StatusCode::UNAUTHORIZED);

        let api_err: ApiError = AuthError::InvalidCredential.into();
        assert_eq!(api_err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
