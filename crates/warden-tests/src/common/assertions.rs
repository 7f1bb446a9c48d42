// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Response Assertions

use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;

/// A buffered response from the test app.
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Parsed JSON body, or `Value::Null` for an empty body.
    pub body: Value,
}

impl TestResponse {
    /// Asserts the status code.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {} with body {}",
            expected,
            self.status,
            self.body
        );
        self
    }

    /// Asserts an error response's status and `code`.
    pub fn assert_error(&self, status: u16, code: &str) -> &Self {
        self.assert_status(status);
        assert_eq!(
            self.body["code"], code,
            "Expected error code {}, got body {}",
            code, self.body
        );
        self
    }

    /// Asserts the error body carries no message.
    pub fn assert_code_only(&self) -> &Self {
        assert!(
            self.body.get("message").is_none(),
            "Expected code-only body, got {}",
            self.body
        );
        self
    }

    /// Returns a string field of the body.
    pub fn str_field(&self, field: &str) -> &str {
        self.body[field]
            .as_str()
            .unwrap_or_else(|| panic!("Expected string field `{}` in {}", field, self.body))
    }
}
