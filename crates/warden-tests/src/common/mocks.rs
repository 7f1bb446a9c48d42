// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Revocation stores with injected latency and failures, plus a counting
//! wrapper for verifying how often the store is consulted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use warden_api::{MemoryRevocationStore, RevocationStore, StoreError};

// =============================================================================
// Hanging Store
// =============================================================================

/// A store whose calls never complete.
#[derive(Debug, Default)]
pub struct HangingStore;

#[async_trait]
impl RevocationStore for HangingStore {
    async fn put(&self, _jti: &str, _ttl: Duration) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn exists(&self, _jti: &str) -> Result<bool, StoreError> {
        std::future::pending().await
    }

    async fn put_if_absent(&self, _jti: &str, _ttl: Duration) -> Result<bool, StoreError> {
        std::future::pending().await
    }

    fn backend(&self) -> &'static str {
        "hanging"
    }
}

// =============================================================================
// Mock Store
// =============================================================================

/// A memory store with switchable failure injection and call counters.
#[derive(Debug, Default)]
pub struct MockRevocationStore {
    inner: MemoryRevocationStore,
    fail_all: AtomicBool,
    latency_ms: AtomicU64,
    put_count: AtomicU64,
    exists_count: AtomicU64,
    put_if_absent_count: AtomicU64,
}

impl MockRevocationStore {
    /// Creates a healthy mock store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every call fail with a connection error.
    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    /// Adds latency before every call.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `put` calls.
    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::SeqCst)
    }

    /// Number of `exists` calls.
    pub fn exists_count(&self) -> u64 {
        self.exists_count.load(Ordering::SeqCst)
    }

    /// Number of `put_if_absent` calls.
    pub fn put_if_absent_count(&self) -> u64 {
        self.put_if_absent_count.load(Ordering::SeqCst)
    }

    /// Number of live revocations.
    pub fn revoked(&self) -> usize {
        self.inner.len()
    }

    async fn before_call(&self) -> Result<(), StoreError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RevocationStore for MockRevocationStore {
    async fn put(&self, jti: &str, ttl: Duration) -> Result<(), StoreError> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;
        self.inner.put(jti, ttl).await
    }

    async fn exists(&self, jti: &str) -> Result<bool, StoreError> {
        self.exists_count.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;
        self.inner.exists(jti).await
    }

    async fn put_if_absent(&self, jti: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.put_if_absent_count.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;
        self.inner.put_if_absent(jti, ttl).await
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}
