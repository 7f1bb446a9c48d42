// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Policy error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading or evaluating policy tables.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A policy source could not be read.
    #[error("failed to read policy source {path}: {source}")]
    Io {
        /// Path of the source.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A policy line could not be parsed.
    #[error("invalid policy line {line} in {origin}: {reason}")]
    Parse {
        /// Where the line came from.
        origin: String,
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The enforcer could not be built from the table.
    #[error("failed to build policy enforcer: {0}")]
    Build(String),

    /// An evaluation could not complete.
    #[error("policy evaluation failed: {0}")]
    Eval(String),
}

impl PolicyError {
    /// Creates a parse error.
    pub fn parse(origin: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.into(),
            line,
            reason: reason.into(),
        }
    }
}
