//! Candidate Ranker: top-N similar records from another collection.

use anyhow::Result;

use crate::config::MatchConfig;
use crate::record::Record;
use crate::similarity::similarity;

/// One ranked candidate for a source record. Transient: only lives for the
/// duration of a resolution session.
#[derive(Clone, Debug)]
pub struct MatchCandidate<'a> {
    pub similarity: f64,
    pub candidate: &'a Record,
}

/// Rank `candidates` against `record`, descending by similarity, keeping
/// only those at or above `min_rate` and at most `max_results` of them.
/// Exactly-equal similarities keep their input order; ties are not an
/// error condition.
pub fn rank<'a>(
    record: &Record,
    candidates: &'a [Record],
    columns: &[String],
    cfg: &MatchConfig,
) -> Result<Vec<MatchCandidate<'a>>> {
    let mut matches = Vec::new();
    for candidate in candidates {
        let sim = similarity(record, candidate, columns, cfg.numeric_tolerance)?;
        if sim >= cfg.min_rate {
            matches.push(MatchCandidate {
                similarity: sim,
                candidate,
            });
        }
    }
    // Stable sort keeps input iteration order for exact ties.
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .expect("similarity scores are never NaN")
    });
    matches.truncate(cfg.max_results);
    Ok(matches)
}

/// Best similarity `record` reaches against any record of `others`.
/// Used by the resolution session to detect candidates that the identity
/// derivation already proves resolved (a perfect 1.0 somewhere).
pub fn best_rate(
    record: &Record,
    others: &[Record],
    columns: &[String],
    numeric_tolerance: f64,
) -> Result<f64> {
    let mut best = f64::MIN;
    for other in others {
        let sim = similarity(record, other, columns, numeric_tolerance)?;
        if sim > best {
            best = sim;
        }
    }
    Ok(best)
}
