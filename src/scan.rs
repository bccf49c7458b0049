//! Non-interactive similarity scan between two collections.
//!
//! Streams every cross-collection pair whose similarity falls inside
//! `[min_rate, 1)` without asking anyone anything; exact matches are left
//! to the identity derivation. Useful for eyeballing thresholds before
//! committing to an interactive session.

use anyhow::Result;

use crate::collection::Collection;
use crate::config::MatchConfig;
use crate::progress::create_progress_bar;
use crate::similarity::similarity;

/// One pair found by the scan; indices into the two collections' records.
#[derive(Clone, Debug)]
pub struct ScanHit {
    pub similarity: f64,
    pub left: usize,
    pub right: usize,
}

/// Compare every record of `a` against every record of `b`. With
/// `highest_match_only` set, only the best-scoring pair per left-hand
/// record is kept.
pub fn scan(
    a: &Collection,
    b: &Collection,
    columns: &[String],
    cfg: &MatchConfig,
) -> Result<Vec<ScanHit>> {
    let pb = create_progress_bar(
        a.records.len() as u64,
        &format!("Finding similarities between {} and {}", a.name, b.name),
    );
    let mut hits = Vec::new();
    for (i, left) in a.records.iter().enumerate() {
        let mut best: Option<ScanHit> = None;
        for (j, right) in b.records.iter().enumerate() {
            let sim = similarity(left, right, columns, cfg.numeric_tolerance)?;
            if sim < cfg.min_rate || sim >= 1.0 {
                continue;
            }
            let hit = ScanHit {
                similarity: sim,
                left: i,
                right: j,
            };
            if cfg.highest_match_only {
                if best.as_ref().map_or(true, |b| sim > b.similarity) {
                    best = Some(hit);
                }
            } else {
                hits.push(hit);
            }
        }
        if let Some(best) = best {
            hits.push(best);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(hits)
}
