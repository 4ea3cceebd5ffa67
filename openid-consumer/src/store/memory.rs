//! In-memory stores backed by `DashMap`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use openid_auth::association::Association;
use openid_auth::nonce::SKEW;

use super::{AssociationStore, NonceStore};

/// Associations held in process memory.
///
/// Lost on restart, which only costs a renegotiation.
#[derive(Default)]
pub struct MemoryAssociationStore {
    /// server_url -> handle -> association
    associations: DashMap<String, HashMap<String, Association>>,
}

impl MemoryAssociationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of associations across all providers.
    pub fn len(&self) -> usize {
        self.associations.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop associations expired at `now`.
    pub fn cleanup_associations_at(&self, now: i64) -> usize {
        let mut removed = 0;
        for mut entry in self.associations.iter_mut() {
            let before = entry.len();
            entry.retain(|_, assoc| !assoc.is_expired(now));
            removed += before - entry.len();
        }
        self.associations.retain(|_, by_handle| !by_handle.is_empty());
        removed
    }
}

impl AssociationStore for MemoryAssociationStore {
    fn store_association(&self, server_url: &str, association: Association) {
        self.associations
            .entry(server_url.to_string())
            .or_default()
            .insert(association.handle().to_string(), association);
    }

    fn get_association(&self, server_url: &str, handle: Option<&str>) -> Option<Association> {
        let by_handle = self.associations.get(server_url)?;
        match handle {
            Some(handle) => by_handle.get(handle).cloned(),
            None => by_handle.values().max_by_key(|assoc| assoc.issued()).cloned(),
        }
    }

    fn remove_association(&self, server_url: &str, handle: &str) -> bool {
        let removed = self
            .associations
            .get_mut(server_url)
            .is_some_and(|mut by_handle| by_handle.remove(handle).is_some());
        if removed {
            self.associations
                .remove_if(server_url, |_, by_handle| by_handle.is_empty());
        }
        removed
    }

    fn cleanup_associations(&self) -> usize {
        self.cleanup_associations_at(Utc::now().timestamp())
    }
}

/// Default capacity of [`MemoryNonceStore`].
pub const DEFAULT_MAX_NONCES: usize = 100_000;

/// Accepted inserts between two pruning passes.
const PRUNE_INTERVAL: u64 = 1000;

/// Used nonces held in process memory.
///
/// # Security Properties
///
/// - Rejects timestamps more than `skew` seconds from `now`
/// - Atomic check-and-insert via the `DashMap` entry API
/// - Entries outside the skew window are pruned every 1000 accepted
///   inserts; older nonces are rejected by the timestamp check anyway
/// - Memory-bounded via `max_entries`: at capacity the oldest nonce is evicted
pub struct MemoryNonceStore {
    /// (server_url, timestamp, salt)
    nonces: DashMap<(String, i64, String), ()>,
    skew: i64,
    max_entries: usize,
    insert_counter: AtomicU64,
}

impl MemoryNonceStore {
    /// Store accepting timestamps within `skew` seconds of now, holding at
    /// most [`DEFAULT_MAX_NONCES`] nonces.
    #[must_use]
    pub fn new(skew: i64) -> Self {
        Self::with_capacity(skew, DEFAULT_MAX_NONCES)
    }

    /// Store holding at most `max_entries` nonces.
    #[must_use]
    pub fn with_capacity(skew: i64, max_entries: usize) -> Self {
        Self {
            nonces: DashMap::new(),
            skew,
            max_entries: max_entries.max(1),
            insert_counter: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }

    fn in_window(&self, timestamp: i64, now: i64) -> bool {
        timestamp.abs_diff(now) <= self.skew.unsigned_abs()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .nonces
            .iter()
            .min_by_key(|entry| entry.key().1)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.nonces.remove(&key);
        }
    }
}

impl Default for MemoryNonceStore {
    fn default() -> Self {
        Self::new(SKEW)
    }
}

impl NonceStore for MemoryNonceStore {
    fn skew(&self) -> i64 {
        self.skew
    }

    fn use_nonce(&self, server_url: &str, timestamp: i64, salt: &str, now: i64) -> bool {
        if !self.in_window(timestamp, now) {
            return false;
        }

        // Entry API keeps check and insert atomic
        let accepted = match self
            .nonces
            .entry((server_url.to_string(), timestamp, salt.to_string()))
        {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(());
                true
            }
        };

        // Entry lock released above
        if accepted {
            let count = self.insert_counter.fetch_add(1, Ordering::Relaxed);
            if count % PRUNE_INTERVAL == 0 {
                self.cleanup_nonces(now);
            }
            while self.nonces.len() > self.max_entries {
                self.evict_oldest();
            }
        }
        accepted
    }

    fn cleanup_nonces(&self, now: i64) -> usize {
        let before = self.nonces.len();
        self.nonces
            .retain(|(_, timestamp, _), _| self.in_window(*timestamp, now));
        before.saturating_sub(self.nonces.len())
    }
}
