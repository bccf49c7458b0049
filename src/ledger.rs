//! Duplicate Ledger: the persistent record of confirmed cross-collection
//! duplicate pairs.
//!
//! A ledger is keyed by a canonical pair of collection names (sorted
//! lexicographically, so "aoty" vs "prog" and "prog" vs "aoty" address the
//! same file) with an explicit swapped flag resolved at load time. Rows are
//! only ever added, never mutated or removed; appending is a set union, so
//! replaying a session against an unchanged ledger is a no-op.

use anyhow::{bail, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::store::{DataStore, Location};

/// Canonical, order-insensitive name for a collection pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairKey {
    left: String,
    right: String,
}

impl PairKey {
    /// Canonicalize `(a, b)`. The returned flag is true when the query order
    /// was reversed relative to the stored order, i.e. `a` is the ledger's
    /// right-hand side.
    pub fn new(a: &str, b: &str) -> (Self, bool) {
        if a <= b {
            (
                Self {
                    left: a.to_string(),
                    right: b.to_string(),
                },
                false,
            )
        } else {
            (
                Self {
                    left: b.to_string(),
                    right: a.to_string(),
                },
                true,
            )
        }
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.left, self.right)
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }
}

/// The identifying fields of one side of a resolved pair. Everything beyond
/// the id is carried so an operator can audit the ledger without the source
/// collections at hand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerSide {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    pub artist: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
}

impl LedgerSide {
    pub fn of(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            internal_id: record.internal_id.clone(),
            artist: record.artist.clone(),
            album: record.album.clone(),
            year: record.year,
        }
    }
}

/// One accepted match, stored relative to the canonical pair order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub left: LedgerSide,
    pub right: LedgerSide,
}

/// Persisted duplicate ledger for one collection pair.
#[derive(Clone, Debug)]
pub struct Ledger {
    key: PairKey,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Open the ledger for `(a, b)`, in either order. A ledger that does not
    /// exist yet starts empty; one that exists but cannot be parsed is a
    /// fatal error surfaced to the caller.
    pub fn open(store: &DataStore, a: &str, b: &str) -> Result<Self> {
        let (key, _) = PairKey::new(a, b);
        let entries = if store.exists(&key.name(), Location::Dedup) {
            store.read(&key.name(), Location::Dedup)?
        } else {
            Vec::new()
        };
        Ok(Self { key, entries })
    }

    pub fn key(&self) -> &PairKey {
        &self.key
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn side_of(&self, name: &str) -> Result<bool> {
        if name == self.key.left {
            Ok(false)
        } else if name == self.key.right {
            Ok(true)
        } else {
            bail!("collection '{name}' is not part of ledger '{}'", self.key.name())
        }
    }

    /// Ids from `name`'s side that already have a recorded resolution.
    pub fn matched_ids(&self, name: &str) -> Result<FxHashSet<String>> {
        let swapped = self.side_of(name)?;
        Ok(self
            .entries
            .iter()
            .map(|e| {
                if swapped {
                    e.right.id.clone()
                } else {
                    e.left.id.clone()
                }
            })
            .collect())
    }

    /// Resolved (key from `name`'s side, key from the other side) pairs,
    /// keyed by internal_id when present, falling back to the canonical id.
    pub fn resolved_keys(&self, name: &str) -> Result<Vec<(String, String)>> {
        let swapped = self.side_of(name)?;
        let key_of = |s: &LedgerSide| s.internal_id.clone().unwrap_or_else(|| s.id.clone());
        Ok(self
            .entries
            .iter()
            .map(|e| {
                if swapped {
                    (key_of(&e.right), key_of(&e.left))
                } else {
                    (key_of(&e.left), key_of(&e.right))
                }
            })
            .collect())
    }

    /// Record one accepted match. `source_name` says which collection the
    /// `source` record came from; the entry is oriented to the canonical
    /// pair order before storage.
    pub fn insert(&mut self, source_name: &str, source: &Record, matched: &Record) -> Result<()> {
        let swapped = self.side_of(source_name)?;
        let entry = if swapped {
            LedgerEntry {
                left: LedgerSide::of(matched),
                right: LedgerSide::of(source),
            }
        } else {
            LedgerEntry {
                left: LedgerSide::of(source),
                right: LedgerSide::of(matched),
            }
        };
        self.entries.push(entry);
        Ok(())
    }

    /// Merge with whatever is on disk and persist. Exact-duplicate rows
    /// collapse to one occurrence; existing rows are never dropped.
    pub fn save(&mut self, store: &DataStore) -> Result<()> {
        let mut merged: Vec<LedgerEntry> = if store.exists(&self.key.name(), Location::Dedup) {
            store.read(&self.key.name(), Location::Dedup)?
        } else {
            Vec::new()
        };
        merged.extend(self.entries.iter().cloned());
        let mut seen: FxHashSet<LedgerEntry> = FxHashSet::default();
        merged.retain(|e| seen.insert(e.clone()));
        merged.sort_by(|a, b| (&a.left.id, &a.right.id).cmp(&(&b.left.id, &b.right.id)));
        store.write(&self.key.name(), Location::Dedup, &merged)?;
        self.entries = merged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::assign_ids;

    fn store() -> (tempfile::TempDir, DataStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        (dir, store)
    }

    fn pair() -> (Record, Record) {
        let mut a = Record::new("Yes", "Close to the Edge", Some(1972));
        let mut b = Record::new("Yes", "Close To The Edge", Some(1972));
        let mut both = vec![a.clone(), b.clone()];
        assign_ids(&mut both, 22);
        a.id = both[0].id.clone();
        b.id = both[1].id.clone();
        (a, b)
    }

    #[test]
    fn test_pair_key_is_order_insensitive() {
        let (k1, swapped1) = PairKey::new("aoty", "prog");
        let (k2, swapped2) = PairKey::new("prog", "aoty");
        assert_eq!(k1, k2);
        assert_eq!(k1.name(), "aoty-prog");
        assert!(!swapped1);
        assert!(swapped2);
    }

    #[test]
    fn test_append_is_set_union() {
        let (_dir, store) = store();
        let (a, b) = pair();
        let mut ledger = Ledger::open(&store, "aoty", "prog").unwrap();
        ledger.insert("aoty", &a, &b).unwrap();
        ledger.save(&store).unwrap();

        // Same entry again, via a fresh session.
        let mut again = Ledger::open(&store, "aoty", "prog").unwrap();
        assert_eq!(again.entries().len(), 1);
        again.insert("aoty", &a, &b).unwrap();
        again.save(&store).unwrap();
        assert_eq!(again.entries().len(), 1);
    }

    #[test]
    fn test_reversed_pair_lookup() {
        let (_dir, store) = store();
        let (a, b) = pair();
        let mut ledger = Ledger::open(&store, "aoty", "prog").unwrap();
        ledger.insert("aoty", &a, &b).unwrap();
        ledger.save(&store).unwrap();

        // Query the same ledger the other way round: left/right swap.
        let reversed = Ledger::open(&store, "prog", "aoty").unwrap();
        assert_eq!(reversed.key().name(), "aoty-prog");
        let prog_ids = reversed.matched_ids("prog").unwrap();
        assert!(prog_ids.contains(&b.id));
        let aoty_ids = reversed.matched_ids("aoty").unwrap();
        assert!(aoty_ids.contains(&a.id));
    }

    #[test]
    fn test_insert_orients_to_canonical_order() {
        let (_dir, store) = store();
        let (a, b) = pair();
        // Session ran as prog-against-aoty; storage is still aoty-prog.
        let mut ledger = Ledger::open(&store, "prog", "aoty").unwrap();
        ledger.insert("prog", &b, &a).unwrap();
        assert_eq!(ledger.entries()[0].left.id, a.id);
        assert_eq!(ledger.entries()[0].right.id, b.id);
    }

    #[test]
    fn test_unknown_collection_name_rejected() {
        let (_dir, store) = store();
        let ledger = Ledger::open(&store, "aoty", "prog").unwrap();
        assert!(ledger.matched_ids("rym").is_err());
    }

    #[test]
    fn test_missing_ledger_starts_empty() {
        let (_dir, store) = store();
        let ledger = Ledger::open(&store, "aoty", "prog").unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_malformed_ledger_is_fatal() {
        let (_dir, store) = store();
        let path = store.path("aoty-prog", Location::Dedup);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{{{").unwrap();
        assert!(Ledger::open(&store, "aoty", "prog").is_err());
    }
}
