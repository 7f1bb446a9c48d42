// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! Every rejection leaves the pipeline as a flat JSON body:
//!
//! - 401: `{"code": "...", "message": "..."}`
//! - 403 and 500: `{"code": "..."}`
//!
//! Codes are stable SCREAMING_SNAKE identifiers for programmatic handling.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::TokenError;
use crate::directory::DirectoryError;
use crate::policy::PolicyError;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// API error type with HTTP status code mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer credential was presented (401).
    #[error("Missing bearer token")]
    MissingToken,

    /// The `Authorization` header is not a bearer credential (401).
    #[error("Malformed authorization header: {message}")]
    MissingHeader {
        /// What was wrong with the header.
        message: String,
    },

    /// Token validation failed (401, or 500 for signing failures).
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Login credentials did not match (401).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A policy denied the request (403).
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Which requirement failed (logged only).
        message: String,
    },

    /// A policy evaluation could not complete (500).
    #[error("Policy evaluation failed: {message}")]
    PolicyEvalFailed {
        /// Evaluator error (logged only).
        message: String,
    },

    /// Bad request (400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Resource not found (404).
    #[error("Resource not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// Conflict (409).
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// Internal server error (500).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl ApiError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a malformed-header error.
    pub fn missing_header(message: impl Into<String>) -> Self {
        Self::MissingHeader {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a policy evaluation error.
    pub fn policy_eval_failed(message: impl Into<String>) -> Self {
        Self::PolicyEvalFailed {
            message: message.into(),
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingToken
            | ApiError::MissingHeader { .. }
            | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Token(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::PolicyEvalFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MissingToken => "MISSING_TOKEN",
            ApiError::MissingHeader { .. } => "MISSING_HEADER",
            ApiError::Token(e) => e.error_code(),
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::PolicyEvalFailed { .. } => "POLICY_EVAL_FAILED",
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns a user-facing message, or `None` when the body carries only
    /// the code.
    ///
    /// Messages never include evaluator, store, or signing internals.
    pub fn user_message(&self) -> Option<String> {
        let message = match self {
            ApiError::MissingToken => "Authentication required".to_string(),
            ApiError::MissingHeader { .. } => {
                "Authorization header must use the Bearer scheme".to_string()
            }
            ApiError::Token(TokenError::Malformed(_)) => "Token is malformed".to_string(),
            ApiError::Token(TokenError::Expired) => "Token has expired".to_string(),
            ApiError::Token(TokenError::SignatureInvalid) => "Token signature is invalid".to_string(),
            ApiError::Token(TokenError::Revoked) => "Token has been revoked".to_string(),
            ApiError::Token(TokenError::StoreUnavailable(_)) => {
                "Token could not be verified, try again later".to_string()
            }
            ApiError::InvalidCredentials => "Invalid email or password".to_string(),
            ApiError::BadRequest { message } | ApiError::Conflict { message } => message.clone(),
            ApiError::NotFound { resource } => format!("{resource} not found"),
            ApiError::Token(TokenError::Signing(_))
            | ApiError::Forbidden { .. }
            | ApiError::PolicyEvalFailed { .. }
            | ApiError::Internal { .. } => return None,
        };
        Some(message)
    }

    /// Returns `true` if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Client error occurred"
            );
        }

        let body = ErrorBody {
            code: error_code.to_string(),
            message: self.user_message(),
        };

        let mut response = (status, Json(body)).into_response();

        if let ApiError::Token(e) = &self {
            if e.is_retryable() {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            }
        }

        response
    }
}

// =============================================================================
// Error Response Body
// =============================================================================

/// Error response body structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// From Implementations
// =============================================================================

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        ApiError::policy_eval_failed(err.to_string())
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(id) => ApiError::not_found(format!("user {id}")),
            DirectoryError::Conflict(message) => ApiError::conflict(message),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

// =============================================================================
// Tests
// =============================================================================
