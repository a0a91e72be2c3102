//! Response Cache — memoizes extracted model output by a lossy input
//! fingerprint.
//!
//! The fingerprint truncates and normalizes the two dominant text inputs,
//! so near-duplicate submissions (the same resume re-analyzed against the
//! same posting, a re-submitted answer with whitespace edits) collapse to
//! one entry. Entries past the TTL count as misses on lookup; no sweeper
//! is needed for correctness, though `store` prunes opportunistically once
//! the map grows. Failures are never stored.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// How many characters of each input participate in the fingerprint.
const FINGERPRINT_PREFIX_CHARS: usize = 120;
/// Soft cap; crossing it triggers an expired-entry prune on store.
const PRUNE_THRESHOLD: usize = 512;

struct CacheEntry {
    value: Value,
    created_at: Instant,
}

/// Process-wide cache of extracted evaluation structures. Optimization
/// state only: it can be dropped and rebuilt at any time.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached structure for this fingerprint, treating expired
    /// entries as absent.
    pub async fn lookup(&self, fingerprint: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        match entries.get(fingerprint) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(fingerprint);
                None
            }
            None => None,
        }
    }

    pub async fn store(&self, fingerprint: String, value: Value) {
        let mut entries = self.entries.lock().await;
        if entries.len() >= PRUNE_THRESHOLD {
            let before = entries.len();
            entries.retain(|_, e| e.created_at.elapsed() < self.ttl);
            debug!(
                pruned = before - entries.len(),
                "pruned expired evaluation cache entries"
            );
        }
        entries.insert(
            fingerprint,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }
}

/// Lossy fingerprint of the two dominant text inputs: first
/// `FINGERPRINT_PREFIX_CHARS` of each, case-folded and
/// whitespace-collapsed, joined with a separator.
pub fn fingerprint(subject: &str, response: &str) -> String {
    format!("{}|{}", normalize_key(subject), normalize_key(response))
}

fn normalize_key(text: &str) -> String {
    let prefix: String = text.chars().take(FINGERPRINT_PREFIX_CHARS).collect();
    prefix
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
