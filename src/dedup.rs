//! Session orchestration: load a collection pair, run the interactive
//! resolution, and persist accepted pairs to the duplicate ledger.
//!
//! This is the one place that reads and writes the ledger in the same
//! operation; the session itself only ever appends through it. Re-running
//! against an unchanged ledger prompts for nothing and writes nothing new.

use anyhow::Result;

use crate::collection::Collection;
use crate::config::MatchConfig;
use crate::ledger::Ledger;
use crate::resolve::{run_session, Prompt};
use crate::store::{DataStore, Location};

/// Find duplicates between two downloaded collections and record every
/// accepted pair. Returns the number of newly accepted matches; acceptances
/// made before an operator abort are persisted all the same.
pub fn find_duplicates(
    store: &DataStore,
    name_a: &str,
    name_b: &str,
    columns: &[String],
    cfg: &MatchConfig,
    prompt: &mut dyn Prompt,
) -> Result<usize> {
    let a = Collection::load(store, name_a, Location::Download, cfg.id_length)?;
    let b = Collection::load(store, name_b, Location::Download, cfg.id_length)?;
    a.report_duplicate_ids(cfg.id_length);
    b.report_duplicate_ids(cfg.id_length);

    let mut ledger = Ledger::open(store, name_a, name_b)?;
    let outcome = run_session(&a, &b, &ledger, columns, cfg, prompt)?;
    if outcome.accepted.is_empty() {
        return Ok(0);
    }
    for (source, matched) in &outcome.accepted {
        ledger.insert(name_a, source, matched)?;
    }
    ledger.save(store)?;
    Ok(outcome.accepted.len())
}
