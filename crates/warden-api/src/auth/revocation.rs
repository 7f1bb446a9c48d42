// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Revocation stores keyed by token id (`jti`).
//!
//! An entry lives for at least the remaining lifetime of the token it
//! revokes. Both backends guarantee that a later, shorter `put` never
//! shortens an existing entry, so a revoked token cannot be resurrected
//! before its own expiry.
//!
//! # Backends
//!
//! - [`MemoryRevocationStore`]: process-local, backed by `DashMap`. Suitable
//!   for single-instance deployments and tests.
//! - [`RedisRevocationStore`]: shared across instances. Reads and writes must
//!   hit the same primary; replica reads may observe a revocation late.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::StoreError;

// =============================================================================
// RevocationStore Trait
// =============================================================================

/// Storage for revoked token identifiers.
#[async_trait]
pub trait RevocationStore: Send + Sync + Debug {
    /// Records `jti` as revoked for at least `ttl`.
    ///
    /// If an entry already exists with a later deadline it is left untouched.
    async fn put(&self, jti: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Returns `true` if `jti` is currently revoked.
    async fn exists(&self, jti: &str) -> Result<bool, StoreError>;

    /// Atomically records `jti` only if no live entry exists.
    ///
    /// Returns `true` if this call created the entry.
    async fn put_if_absent(&self, jti: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Returns the backend name for logging.
    fn backend(&self) -> &'static str;
}

// =============================================================================
// MemoryRevocationStore
// =============================================================================

/// In-memory revocation store.
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    entries: DashMap<String, Instant>,
    shutdown: Notify,
}

impl MemoryRevocationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, deadline| *deadline > now);
        before.saturating_sub(self.entries.len())
    }

    /// Starts a background task that purges expired entries every `interval`.
    ///
    /// The task ends when [`MemoryRevocationStore::stop_sweeper`] is called.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);

        tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "Revocation sweeper started");

            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = store.purge_expired();
                        if purged > 0 {
                            debug!(purged, remaining = store.len(), "Purged expired revocations");
                        }
                    }
                    _ = store.shutdown.notified() => break,
                }
            }

            info!("Revocation sweeper stopped");
        })
    }

    /// Signals the background sweeper to stop.
    pub fn stop_sweeper(&self) {
        self.shutdown.notify_one();
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn put(&self, jti: &str, ttl: Duration) -> Result<(), StoreError> {
        let deadline = Instant::now() + ttl;

        match self.entries.entry(jti.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() < deadline {
                    *entry.get_mut() = deadline;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(deadline);
            }
        }
        Ok(())
    }

    async fn exists(&self, jti: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let live = match self.entries.get(jti) {
            Some(deadline) => *deadline > now,
            None => return Ok(false),
        };

        if !live {
            self.entries.remove_if(jti, |_, deadline| *deadline <= now);
        }
        Ok(live)
    }

    async fn put_if_absent(&self, jti: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let deadline = now + ttl;

        match self.entries.entry(jti.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    return Ok(false);
                }
                *entry.get_mut() = deadline;
                Ok(true)
            }
            Entry::Vacant(entry) => {
                entry.insert(deadline);
                Ok(true)
            }
        }
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// RedisRevocationStore
// =============================================================================

/// Default key prefix for revocation entries.
pub const DEFAULT_KEY_PREFIX: &str = "warden:revoked:";

/// Creates the entry or extends it to `ARGV[1]` seconds, in one step.
///
/// `TTL` is -2 for a missing key and -1 for a key without expiry; the latter
/// is never touched.
const PUT_SCRIPT: &str = r#"
local ttl = redis.call('TTL', KEYS[1])
local secs = tonumber(ARGV[1])
if ttl == -2 or (ttl >= 0 and ttl < secs) then
    redis.call('SET', KEYS[1], 1, 'EX', secs)
    return 1
end
return 0
"#;

/// Redis-backed revocation store.
///
/// `put` runs as a single Lua script so an entry expiring between the
/// existence check and the extension cannot drop the revocation.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
    prefix: String,
    put_script: Script,
}

impl RedisRevocationStore {
    /// Connects to the given Redis URL.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Connected to Redis revocation store");

        Ok(Self {
            conn,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            put_script: Script::new(PUT_SCRIPT),
        })
    }

    /// Overrides the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, jti: &str) -> String {
        format!("{}{}", self.prefix, jti)
    }

    /// Sets the key only if absent, returning `true` when it was created.
    async fn set_nx_ex(&self, key: &str, secs: u64) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(secs)
            .query_async(&mut conn)
            .await?;

        Ok(reply.is_some())
    }
}

/// Converts a TTL to whole seconds, rounding up and never below one.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, jti: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let written: i64 = self
            .put_script
            .key(self.key(jti))
            .arg(ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await?;

        debug!(jti, extended = written == 1, "Revocation entry stored");
        Ok(())
    }

    async fn exists(&self, jti: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(self.key(jti)).await?;
        Ok(exists)
    }

    async fn put_if_absent(&self, jti: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.set_nx_ex(&self.key(jti), ttl_secs(ttl)).await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

impl Debug for RedisRevocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRevocationStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
