//! Named record collections and the set operations over them.
//!
//! A collection is a named, schema-sharing set of records from one
//! provenance (a download, or a derived merge/diff result). Ordering is
//! irrelevant on disk; anything that needs determinism sorts by id first.

use any_ascii::any_ascii;
use anyhow::{bail, Result};
use rustc_hash::FxHashSet;
use strsim::jaro_winkler;

use crate::ident::compute_id;
use crate::ledger::Ledger;
use crate::record::Record;
use crate::store::{DataStore, Location};

#[derive(Clone, Debug)]
pub struct Collection {
    pub name: String,
    pub location: Location,
    pub records: Vec<Record>,
}

impl Collection {
    pub fn new(name: impl Into<String>, location: Location, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            location,
            records,
        }
    }

    /// Load a named collection, assigning ids to any record that still
    /// lacks one (freshly scraped data arrives without them).
    pub fn load(store: &DataStore, name: &str, location: Location, id_length: usize) -> Result<Self> {
        if !store.exists(name, location) {
            bail!("couldn't find '{name}' under {location}");
        }
        let mut records: Vec<Record> = store.read(name, location)?;
        for record in records.iter_mut().filter(|r| r.id.is_empty()) {
            record.id = compute_id(record, id_length);
        }
        Ok(Self::new(name, location, records))
    }

    pub fn save(&self, store: &DataStore) -> Result<()> {
        store.write(&self.name, self.location, &self.records)
    }

    /// Records in ascending id order; the order every resolution session
    /// walks, so prompt sequences reproduce run-to-run.
    pub fn sorted_by_id(&self) -> Vec<&Record> {
        let mut refs: Vec<&Record> = self.records.iter().collect();
        refs.sort_by(|a, b| a.id.cmp(&b.id));
        refs
    }

    pub fn ids(&self) -> FxHashSet<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    /// Dedup key of a record: the source-assigned internal id when present,
    /// the canonical id otherwise.
    fn key_of(record: &Record) -> String {
        record
            .internal_id
            .clone()
            .unwrap_or_else(|| record.id.clone())
    }

    fn keys(&self) -> FxHashSet<String> {
        self.records.iter().map(Self::key_of).collect()
    }

    /// Records whose id occurs more than once. Structural id collisions are
    /// reported, never silently dropped.
    pub fn duplicate_ids(&self) -> Vec<&Record> {
        let mut counts: rustc_hash::FxHashMap<&str, usize> = rustc_hash::FxHashMap::default();
        for record in &self.records {
            *counts.entry(record.id.as_str()).or_default() += 1;
        }
        self.records
            .iter()
            .filter(|r| counts[r.id.as_str()] > 1)
            .collect()
    }

    /// Data-quality warning for colliding or degenerate ids. Non-fatal: the
    /// fix (a longer id length) is the operator's call.
    pub fn report_duplicate_ids(&self, id_length: usize) {
        let duplicated = self.duplicate_ids();
        if duplicated.is_empty() {
            return;
        }
        eprintln!("Duplicated id in '{}':", self.name);
        for record in duplicated {
            eprintln!("  {} <- «{}»", record.id, record);
        }
        eprintln!("Consider increasing the id length (current one: {id_length}).");
    }

    /// Remove records the ledger already resolved as duplicates of a record
    /// that is actually present in `other`.
    pub fn deduplicated_from(&self, other: &Self, ledger: &Ledger) -> Result<Self> {
        if ledger.is_empty() {
            return Ok(self.clone());
        }
        let other_keys = other.keys();
        let resolved: FxHashSet<String> = ledger
            .resolved_keys(&self.name)?
            .into_iter()
            .filter(|(_, other_key)| other_keys.contains(other_key))
            .map(|(own_key, _)| own_key)
            .collect();
        let records = self
            .records
            .iter()
            .filter(|r| !resolved.contains(&Self::key_of(r)))
            .cloned()
            .collect();
        Ok(Self::new(self.name.clone(), self.location, records))
    }

    /// Union of the two collections: everything from `self`, plus the
    /// records of `other` not already resolved as duplicates, unique by id
    /// keeping the first occurrence.
    pub fn merge_with(&self, other: &Self, ledger: &Ledger) -> Result<Self> {
        let other_dedup = other.deduplicated_from(self, ledger)?;
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut records = Vec::with_capacity(self.records.len() + other_dedup.records.len());
        for record in self.records.iter().chain(other_dedup.records.iter()) {
            if seen.insert(record.id.clone()) {
                records.push(record.clone());
            }
        }
        Ok(Self::new(
            format!("{}-{}", self.name, other.name),
            Location::Merge,
            records,
        ))
    }

    /// Records of `self` that are in no way present in `other`: neither
    /// resolved as a duplicate by the ledger nor sharing an id.
    pub fn diff_with(&self, other: &Self, ledger: &Ledger) -> Result<Self> {
        let dedup = self.deduplicated_from(other, ledger)?;
        let other_ids = other.ids();
        let records = dedup
            .records
            .into_iter()
            .filter(|r| !other_ids.contains(&r.id))
            .collect();
        Ok(Self::new(
            format!("{}-{}", self.name, other.name),
            Location::Diff,
            records,
        ))
    }

    /// Free-text fuzzy search over the given columns, descending by score.
    /// Columns a record lacks simply don't contribute for that record.
    pub fn search(&self, text: &str, columns: &[String], max_results: usize) -> Vec<(f64, &Record)> {
        let query = any_ascii(text).to_lowercase();
        let mut scored: Vec<(f64, &Record)> = self
            .records
            .iter()
            .map(|record| {
                let score = columns
                    .iter()
                    .filter_map(|col| record.field_str(col).ok())
                    .map(|value| jaro_winkler(&query, &any_ascii(&value).to_lowercase()))
                    .sum::<f64>();
                (score, record)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).expect("scores are never NaN"));
        scored.truncate(max_results);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::assign_ids as assign;

    fn records(rows: &[(&str, &str, i64, &str)]) -> Vec<Record> {
        let mut out: Vec<Record> = rows
            .iter()
            .map(|(artist, album, year, internal)| {
                let mut r = Record::new(*artist, *album, Some(*year));
                r.internal_id = Some(internal.to_string());
                r
            })
            .collect();
        assign(&mut out, 22);
        out
    }

    fn aoty() -> Collection {
        Collection::new(
            "aoty",
            Location::Download,
            records(&[
                ("Radiohead", "OK Computer", 1997, "a1"),
                ("Slint", "Spiderland", 1991, "a2"),
            ]),
        )
    }

    fn prog() -> Collection {
        Collection::new(
            "prog",
            Location::Download,
            records(&[
                ("Radiohead", "OK Computer", 1997, "p1"),
                ("King Crimson", "Red", 1974, "p2"),
            ]),
        )
    }

    fn resolved_ledger(store: &DataStore, a: &Collection, b: &Collection) -> Ledger {
        let mut ledger = Ledger::open(store, &a.name, &b.name).unwrap();
        ledger
            .insert(&a.name, &a.records[0], &b.records[0])
            .unwrap();
        ledger
    }

    #[test]
    fn test_sorted_by_id() {
        let c = aoty();
        let sorted = c.sorted_by_id();
        assert!(sorted.windows(2).all(|w| w[0].id <= w[1].id));
    }

    #[test]
    fn test_duplicate_id_detection() {
        let mut rows = records(&[
            ("Yes", "Close to the Edge", 1972, "x1"),
            ("Yes", "Close To The Edge", 1972, "x2"),
            ("Can", "Tago Mago", 1971, "x3"),
        ]);
        assign(&mut rows, 22);
        let c = Collection::new("aoty", Location::Download, rows);
        assert_eq!(c.duplicate_ids().len(), 2);
    }

    #[test]
    fn test_merge_excludes_resolved_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let a = aoty();
        let b = prog();
        let ledger = resolved_ledger(&store, &a, &b);
        let merged = a.merge_with(&b, &ledger).unwrap();
        assert_eq!(merged.name, "aoty-prog");
        assert_eq!(merged.location, Location::Merge);
        // Both OK Computers collapse to aoty's copy.
        assert_eq!(merged.records.len(), 3);
        assert!(merged
            .records
            .iter()
            .any(|r| r.internal_id.as_deref() == Some("a1")));
        assert!(!merged
            .records
            .iter()
            .any(|r| r.internal_id.as_deref() == Some("p1")));
    }

    #[test]
    fn test_diff_excludes_shared_and_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let a = aoty();
        let b = prog();
        let ledger = resolved_ledger(&store, &a, &b);
        let diff = a.diff_with(&b, &ledger).unwrap();
        assert_eq!(diff.location, Location::Diff);
        assert_eq!(diff.records.len(), 1);
        assert_eq!(diff.records[0].artist, "Slint");
    }

    #[test]
    fn test_diff_with_empty_ledger_uses_ids_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let a = aoty();
        let b = prog();
        let empty = Ledger::open(&store, &a.name, &b.name).unwrap();
        let diff = a.diff_with(&b, &empty).unwrap();
        // OK Computer drops out anyway: identical derived id on both sides.
        assert_eq!(diff.records.len(), 1);
    }

    #[test]
    fn test_search_ranks_closest_first() {
        let c = aoty();
        let columns = vec!["artist".to_string(), "album".to_string()];
        let results = c.search("ok computer", &columns, 5);
        assert_eq!(results[0].1.album, "OK Computer");
        assert!(results[0].0 >= results[1].0);
    }

    #[test]
    fn test_load_missing_collection_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        assert!(Collection::load(&store, "aoty", Location::Download, 22).is_err());
    }

    #[test]
    fn test_load_assigns_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let rows = vec![Record::new("Can", "Tago Mago", Some(1971))];
        store.write("aoty", Location::Download, &rows).unwrap();
        let c = Collection::load(&store, "aoty", Location::Download, 22).unwrap();
        assert_eq!(c.records[0].id, "can-1971-tagomago");
    }
}
