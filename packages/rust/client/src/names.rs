//! Display-name cleanup with bounded memoization.
//!
//! KEGG flat-file NAME lines carry marker text ("NAME", "(RefSeq)") that is
//! stripped before display. The cleanup functions are pure; the same raw
//! names recur across genes in a scan, so results are memoized in a small
//! fixed-capacity LRU.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Memoization capacity per cleanup function.
const MEMO_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// LRU memo
// ---------------------------------------------------------------------------

/// Fixed-capacity least-recently-used map from raw name to cleaned name.
struct LruMemo {
    capacity: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl LruMemo {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&mut self, key: &str) -> Option<String> {
        let value = self.entries.get(key)?.clone();
        // Move the key to the back of the access order.
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.to_string());
        Some(value)
    }

    fn insert(&mut self, key: String, value: String) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
    }
}

// ---------------------------------------------------------------------------
// NameCleaner
// ---------------------------------------------------------------------------

/// Memoizing wrapper around the pure name-cleanup functions.
pub struct NameCleaner {
    genes: Mutex<LruMemo>,
    drugs: Mutex<LruMemo>,
}

impl Default for NameCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl NameCleaner {
    pub fn new() -> Self {
        Self {
            genes: Mutex::new(LruMemo::new(MEMO_CAPACITY)),
            drugs: Mutex::new(LruMemo::new(MEMO_CAPACITY)),
        }
    }

    /// Clean a gene display name, memoized.
    pub fn gene_name(&self, raw: &str) -> String {
        let mut memo = self.genes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = memo.get(raw) {
            return hit;
        }
        let cleaned = clean_gene_name(raw);
        memo.insert(raw.to_string(), cleaned.clone());
        cleaned
    }

    /// Clean a drug display name, memoized.
    pub fn drug_name(&self, raw: &str) -> String {
        let mut memo = self.drugs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = memo.get(raw) {
            return hit;
        }
        let cleaned = clean_drug_name(raw);
        memo.insert(raw.to_string(), cleaned.clone());
        cleaned
    }
}

/// Strip NAME/RefSeq markers from a gene display name.
fn clean_gene_name(name: &str) -> String {
    name.replace("NAME (RefSeq)", "")
        .trim()
        .replace("NAME", "")
        .trim()
        .replace("(RefSeq)", "")
        .trim()
        .to_string()
}

/// Strip the NAME marker from a drug display name.
fn clean_drug_name(name: &str) -> String {
    name.replace("NAME", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gene_name_strips_markers() {
        assert_eq!(clean_gene_name("NAME (RefSeq) PTK2B"), "PTK2B");
        assert_eq!(clean_gene_name("(RefSeq) PTK2B, FAK2"), "PTK2B, FAK2");
        assert_eq!(clean_gene_name("PTK2B"), "PTK2B");
    }

    #[test]
    fn drug_name_strips_marker() {
        assert_eq!(clean_drug_name("NAME        Leflunomide (JAN/USP/INN)"), "Leflunomide (JAN/USP/INN)");
        assert_eq!(clean_drug_name("Leflunomide"), "Leflunomide");
    }

    #[test]
    fn memo_returns_consistent_results() {
        let cleaner = NameCleaner::new();
        assert_eq!(cleaner.gene_name("NAME PTK2B"), "PTK2B");
        assert_eq!(cleaner.gene_name("NAME PTK2B"), "PTK2B");
        assert_eq!(cleaner.drug_name("NAME DrugA"), "DrugA");
    }

    #[test]
    fn lru_evicts_oldest() {
        let mut memo = LruMemo::new(2);
        memo.insert("a".into(), "1".into());
        memo.insert("b".into(), "2".into());
        // Touch "a" so "b" becomes the eviction candidate.
        assert_eq!(memo.get("a").as_deref(), Some("1"));
        memo.insert("c".into(), "3".into());
        assert!(memo.get("b").is_none());
        assert_eq!(memo.get("a").as_deref(), Some("1"));
        assert_eq!(memo.get("c").as_deref(), Some("3"));
    }
}
