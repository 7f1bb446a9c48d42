// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Principal identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity of a request's caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Numeric principal id.
    pub id: i64,
    /// Stable external identifier.
    pub uuid: Uuid,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role name, evaluated against the policy tables.
    pub role: String,
}

impl Principal {
    /// Creates a new principal.
    pub fn new(
        id: i64,
        uuid: Uuid,
        email: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id,
            uuid,
            email: email.into(),
            name: name.into(),
            role: role.into(),
        }
    }
}
