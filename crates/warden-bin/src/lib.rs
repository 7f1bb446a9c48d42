// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-bin
//!
//! CLI binary for the warden administrative API.
//!
//! ```text
//!                    main.rs
//!                       │
//!                    cli.rs ──► commands ──► runtime ──► warden-api::ApiServer
//!                                   │           │
//!                                config      shutdown
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! warden -c /etc/warden/warden.yaml
//!
//! # Check configuration and policy tables
//! warden validate --strict
//!
//! # Produce a password hash for a principal seed
//! echo -n 's3cret' | warden hash-password --stdin
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

pub use cli::{Cli, Commands};
pub use config::{load_config, ConfigLoader};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{RuntimeBuilder, WardenRuntime};
pub use shutdown::ShutdownCoordinator;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
