// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Principal directory.
//!
//! The directory is the lookup collaborator for login and profile routes.
//! Persistence is outside this crate; [`InMemoryDirectory`] serves seeded
//! principals from configuration and tests.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Principal;

// =============================================================================
// Errors
// =============================================================================

/// Errors produced by a principal directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No principal has the given id.
    #[error("principal {0} not found")]
    NotFound(i64),

    /// The update would collide with another principal.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A password hash could not be produced or parsed.
    #[error("password hash error: {0}")]
    Hash(String),

    /// The backing store failed.
    #[error("directory backend error: {0}")]
    Backend(String),
}

// =============================================================================
// Records
// =============================================================================

/// A principal together with its stored credential.
#[derive(Clone, Serialize, Deserialize)]
pub struct PrincipalRecord {
    /// The principal.
    #[serde(flatten)]
    pub principal: Principal,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl Debug for PrincipalRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalRecord")
            .field("principal", &self.principal)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// A principal as declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalSeed {
    /// Numeric principal id.
    pub id: i64,
    /// Stable external identifier; generated when omitted.
    #[serde(default)]
    pub uuid: Option<Uuid>,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role name.
    pub role: String,
    /// Argon2 PHC string, as produced by `warden hash-password`.
    pub password_hash: String,
}

impl From<PrincipalSeed> for PrincipalRecord {
    fn from(seed: PrincipalSeed) -> Self {
        Self {
            principal: Principal::new(
                seed.id,
                seed.uuid.unwrap_or_else(Uuid::new_v4),
                seed.email,
                seed.name,
                seed.role,
            ),
            password_hash: seed.password_hash,
        }
    }
}

/// Fields a principal may change on their profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New login email.
    #[serde(default)]
    pub email: Option<String>,
}

impl ProfileUpdate {
    /// Returns `true` if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

// =============================================================================
// PrincipalDirectory
// =============================================================================

/// Lookup and profile storage for principals.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync + Debug {
    /// Finds a principal and credential by login email.
    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalRecord>, DirectoryError>;

    /// Finds a principal by numeric id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>, DirectoryError>;

    /// Applies a profile update and returns the updated principal.
    async fn update(&self, id: i64, update: ProfileUpdate) -> Result<Principal, DirectoryError>;
}

/// Verifies a login.
///
/// Unknown emails still run a hash verification so both failure paths take
/// comparable time. Returns `Ok(None)` for any credential mismatch.
///
/// Argon2 runs on the blocking pool so a login never stalls the worker that
/// is serving other requests.
pub async fn authenticate(
    directory: &dyn PrincipalDirectory,
    email: &str,
    password: &str,
) -> Result<Option<Principal>, DirectoryError> {
    let record = directory.find_by_email(email).await?;

    let hash = record.as_ref().map(|record| record.password_hash.clone());
    let password = password.to_owned();
    let matches = tokio::task::spawn_blocking(move || match &hash {
        Some(hash) => verify_password(&password, hash),
        None => verify_password(&password, dummy_hash()?),
    })
    .await
    .map_err(|e| DirectoryError::Backend(format!("password verification task failed: {e}")))??;

    Ok(match record {
        Some(record) if matches => Some(record.principal),
        _ => None,
    })
}

fn dummy_hash() -> Result<&'static str, DirectoryError> {
    static DUMMY: OnceLock<String> = OnceLock::new();

    if let Some(hash) = DUMMY.get() {
        return Ok(hash.as_str());
    }
    let hash = hash_password("warden-dummy-password")?;
    Ok(DUMMY.get_or_init(|| hash).as_str())
}

/// Hashes a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, DirectoryError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DirectoryError::Hash(e.to_string()))
}

/// Checks a password against an Argon2 PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, DirectoryError> {
    let parsed = PasswordHash::new(hash).map_err(|e| DirectoryError::Hash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DirectoryError::Hash(e.to_string())),
    }
}

// =============================================================================
// InMemoryDirectory
// =============================================================================

/// A directory held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    records: RwLock<HashMap<i64, PrincipalRecord>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory from records, rejecting duplicate ids or emails.
    pub fn from_records(
        records: impl IntoIterator<Item = PrincipalRecord>,
    ) -> Result<Self, DirectoryError> {
        let directory = Self::new();
        for record in records {
            directory.insert(record)?;
        }
        Ok(directory)
    }

    /// Creates a directory from configuration seeds.
    pub fn from_seeds(seeds: impl IntoIterator<Item = PrincipalSeed>) -> Result<Self, DirectoryError> {
        Self::from_records(seeds.into_iter().map(PrincipalRecord::from))
    }

    /// Adds a record.
    pub fn insert(&self, record: PrincipalRecord) -> Result<(), DirectoryError> {
        let mut records = self.records.write();

        if records.contains_key(&record.principal.id) {
            return Err(DirectoryError::Conflict(format!(
                "duplicate principal id {}",
                record.principal.id
            )));
        }
        if find_email(&records, &record.principal.email).is_some() {
            return Err(DirectoryError::Conflict(format!(
                "duplicate email {}",
                record.principal.email
            )));
        }

        records.insert(record.principal.id, record);
        Ok(())
    }

    /// Returns the number of principals.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn find_email<'a>(
    records: &'a HashMap<i64, PrincipalRecord>,
    email: &str,
) -> Option<&'a PrincipalRecord> {
    records
        .values()
        .find(|r| r.principal.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl PrincipalDirectory for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalRecord>, DirectoryError> {
        Ok(find_email(&self.records.read(), email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>, DirectoryError> {
        Ok(self.records.read().get(&id).map(|r| r.principal.clone()))
    }

    async fn update(&self, id: i64, update: ProfileUpdate) -> Result<Principal, DirectoryError> {
        let mut records = self.records.write();

        if let Some(email) = &update.email {
            if let Some(other) = find_email(&records, email) {
                if other.principal.id != id {
                    return Err(DirectoryError::Conflict(format!("email {email} is taken")));
                }
            }
        }

        let record = records.get_mut(&id).ok_or(DirectoryError::NotFound(id))?;
        if let Some(name) = update.name {
            record.principal.name = name;
        }
        if let Some(email) = update.email {
            record.principal.email = email;
        }

        Ok(record.principal.clone())
    }
}
