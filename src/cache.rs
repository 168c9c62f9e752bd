// src/cache.rs
//! Cache Gateway: last known item set per source with an update timestamp.
//! The orchestrator consumes this best-effort — a failed read counts as
//! cache-absent and a failed write never fails a request.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{now_ms, CacheEntry, ContentItem};

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, source_id: &str) -> Result<Option<CacheEntry>>;
    /// Replace the entry for `source_id` atomically, stamping it with the
    /// current time.
    async fn set(&self, source_id: &str, items: Vec<ContentItem>) -> Result<()>;
}

/// In-process cache keyed by source id.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-built entry, keeping its timestamp. Used to seed state
    /// in tests and warm starts.
    pub fn insert_entry(&self, source_id: &str, entry: CacheEntry) {
        let mut map = self.entries.write().unwrap_or_else(|p| p.into_inner());
        map.insert(source_id.to_string(), entry);
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, source_id: &str) -> Result<Option<CacheEntry>> {
        let map = self.entries.read().unwrap_or_else(|p| p.into_inner());
        Ok(map.get(source_id).cloned())
    }

    async fn set(&self, source_id: &str, items: Vec<ContentItem>) -> Result<()> {
        let entry = CacheEntry {
            items,
            updated_at: now_ms(),
        };
        self.insert_entry(source_id, entry);
        Ok(())
    }
}
