//! Process-local record ledger shared by the sample tools
//!
//! Entries live until the process exits. Identifiers are `<prefix><n>` with
//! `n` drawn from a fixed seven-digit range; a collision overwrites the
//! earlier entry.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Smallest numeric suffix an identifier can carry
pub const ID_MIN: u32 = 1_000_000;
/// Largest numeric suffix an identifier can carry
pub const ID_MAX: u32 = 9_999_999;

/// Write-mostly map from generated identifier to record
#[derive(Debug)]
pub struct Ledger<T> {
    prefix: &'static str,
    entries: Arc<RwLock<HashMap<String, T>>>,
}

impl<T> Clone for Ledger<T> {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix,
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T: Clone + Send + Sync> Ledger<T> {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Mint a fresh identifier for this ledger
    pub fn next_id(&self) -> String {
        let n = rand::thread_rng().gen_range(ID_MIN..=ID_MAX);
        format!("{}{}", self.prefix, n)
    }

    /// Store a record under a newly minted identifier and return it
    pub async fn record(&self, value: T) -> String {
        let id = self.next_id();
        let mut entries = self.entries.write().await;
        entries.insert(id.clone(), value);
        debug!("Ledger {} now holds {} entries", self.prefix, entries.len());
        id
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copy of every entry, in no particular order
    pub async fn snapshot(&self) -> Vec<(String, T)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffix(id: &str, prefix: &str) -> u32 {
        id.strip_prefix(prefix).unwrap().parse().unwrap()
    }

    #[test]
    fn test_next_id_shape() {
        let ledger: Ledger<String> = Ledger::new("note_");
        for _ in 0..200 {
            let id = ledger.next_id();
            let n = suffix(&id, "note_");
            assert!((ID_MIN..=ID_MAX).contains(&n), "out of range: {}", id);
        }
    }

    #[tokio::test]
    async fn test_record_and_get() {
        let ledger: Ledger<String> = Ledger::new("note_");
        assert!(ledger.is_empty().await);

        let id = ledger.record("first".to_string()).await;
        assert!(id.starts_with("note_"));
        assert_eq!(ledger.get(&id).await.as_deref(), Some("first"));
        assert_eq!(ledger.len().await, 1);
        assert!(ledger.get("note_0").await.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let ledger: Ledger<u32> = Ledger::new("note_");
        let other = ledger.clone();
        let id = other.record(7).await;

        assert_eq!(ledger.get(&id).await, Some(7));
        let snapshot = ledger.snapshot().await;
        assert_eq!(snapshot, vec![(id, 7)]);
    }

    #[tokio::test]
    async fn test_concurrent_records() {
        let ledger: Ledger<usize> = Ledger::new("note_");
        let mut handles = Vec::new();
        for i in 0..20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.record(i).await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // Seven-digit suffixes make a collision among 20 draws vanishingly rare
        assert!(ledger.len().await >= 19);
    }
}
