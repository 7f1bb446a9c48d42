// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `hash-password` command.

use std::io::BufRead;

use crate::cli::{Cli, HashPasswordArgs};
use crate::error::{BinError, BinResult};

/// Prints an Argon2id hash suitable for a principal's `password_hash`.
pub fn hash_password(_cli: &Cli, args: HashPasswordArgs) -> BinResult<()> {
    let password = read_password(&args)?;
    if password.is_empty() {
        return Err(BinError::config("Password must not be empty"));
    }

    let hash = warden_api::directory::hash_password(&password)?;
    println!("{hash}");

    Ok(())
}

fn read_password(args: &HashPasswordArgs) -> BinResult<String> {
    if let Some(password) = &args.password {
        if !args.stdin {
            return Ok(password.clone());
        }
    }

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_password_is_used() {
        let args = HashPasswordArgs {
            password: Some("hunter2".to_string()),
            stdin: false,
        };
        assert_eq!(read_password(&args).unwrap(), "hunter2");
    }

    #[test]
    fn test_produced_hash_verifies() {
        let hash = warden_api::directory::hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(warden_api::directory::verify_password("hunter2", &hash).unwrap());
    }
}
