//! Similarity Scorer: bounded pairwise record similarity.
//!
//! Strings are compared with a gestalt sequence-match ratio (2 * matching
//! character runs / total length); numeric columns contribute
//! `1 - |a - b| * tolerance`. Per-column scores are aggregated with the
//! median, so one wildly mismatched column cannot drown out two columns
//! that already agree strongly.

use anyhow::Result;
use rustc_hash::FxHashMap;

use crate::record::{Field, Record};

/// Longest matching run between `a[alo..ahi]` and `b[blo..bhi]`.
/// `b2j` maps each character of `b` to its (sorted) positions.
fn longest_match(
    a: &[char],
    b2j: &FxHashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);
    let mut j2len: FxHashMap<usize, usize> = FxHashMap::default();
    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut newj2len: FxHashMap<usize, usize> = FxHashMap::default();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = if j == 0 {
                    1
                } else {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                };
                newj2len.insert(j, k);
                if k > bestsize {
                    besti = i + 1 - k;
                    bestj = j + 1 - k;
                    bestsize = k;
                }
            }
        }
        j2len = newj2len;
    }
    (besti, bestj, bestsize)
}

/// Total characters covered by matching runs, found by recursively taking
/// the longest common run and matching what lies to either side of it.
fn matching_chars(
    a: &[char],
    b2j: &FxHashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> usize {
    let (i, j, size) = longest_match(a, b2j, alo, ahi, blo, bhi);
    if size == 0 {
        return 0;
    }
    size + matching_chars(a, b2j, alo, i, blo, j) + matching_chars(a, b2j, i + size, ahi, j + size, bhi)
}

/// Gestalt pattern-matching ratio in [0, 1]; 1.0 for identical strings,
/// 0.0 for fully disjoint ones.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let mut b2j: FxHashMap<char, Vec<usize>> = FxHashMap::default();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }
    let matches = matching_chars(&a, &b2j, 0, a.len(), 0, b.len());
    2.0 * matches as f64 / total as f64
}

/// Median of the collected per-column scores; for an even count, the mean
/// of the two middle values.
fn median(mut scores: Vec<f64>) -> f64 {
    scores.sort_by(|a, b| a.partial_cmp(b).expect("similarity scores are never NaN"));
    let n = scores.len();
    if n % 2 == 1 {
        scores[n / 2]
    } else {
        (scores[n / 2 - 1] + scores[n / 2]) / 2.0
    }
}

/// Similarity between two records over `columns`.
///
/// The left record's column type picks the metric: strings use [`ratio`]
/// against the other side's string form, numbers use
/// `1 - |a - b| * numeric_tolerance`. The numeric contribution is not
/// clamped; a tolerance large enough to push it negative ranks the pair as
/// anti-similar, which is the historical behavior and is covered by tests.
///
/// A column absent from either side is a hard error; schema alignment is
/// the caller's job.
pub fn similarity(
    a: &Record,
    b: &Record,
    columns: &[String],
    numeric_tolerance: f64,
) -> Result<f64> {
    if columns.is_empty() {
        anyhow::bail!("no comparison columns given");
    }
    let mut scores = Vec::with_capacity(columns.len());
    for column in columns {
        let score = match a.field(column)? {
            Field::Str(left) => ratio(left, &b.field_str(column)?),
            Field::Num(left) => {
                let right = match b.field(column)? {
                    Field::Num(n) => n,
                    Field::Str(_) => anyhow::bail!(
                        "column '{column}' is numeric in «{a}» but text in «{b}»"
                    ),
                };
                1.0 - (left - right).abs() * numeric_tolerance
            }
        };
        scores.push(score);
    }
    Ok(median(scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn columns() -> Vec<String> {
        vec!["artist".to_string(), "album".to_string(), "year".to_string()]
    }

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(ratio("abbey road", "abbey road"), 1.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_ratio_partial_overlap() {
        // Longest run "bcd" (3 chars) over 8 total characters.
        assert_eq!(ratio("abcd", "bcde"), 0.75);
        // Runs found recursively on both sides of the longest one.
        assert_eq!(ratio("abxcd", "abcd"), 2.0 * 4.0 / 9.0);
    }

    #[test]
    fn test_ratio_symmetric_enough() {
        let a = "In the Court of the Crimson King";
        let b = "In the Court of the Crimson King (40th Anniversary)";
        let r = ratio(a, b);
        assert!(r > 0.7 && r < 1.0);
    }

    #[test]
    fn test_self_similarity_is_one() {
        let r = Record::new("Radiohead", "OK Computer", Some(1997));
        assert_eq!(similarity(&r, &r, &columns(), 0.25).unwrap(), 1.0);
    }

    #[test]
    fn test_median_rescues_one_bad_column() {
        let a = Record::new("Radiohead", "OK Computer", Some(1997));
        let b = Record::new("Radiohead", "OK Computer", Some(2007));
        // artist and album agree exactly; the decade-off year is the median's
        // lower neighbour and is outvoted.
        assert_eq!(similarity(&a, &b, &columns(), 0.25).unwrap(), 1.0);
    }

    #[test]
    fn test_numeric_contribution_unclamped() {
        let a = Record::new("x", "x", Some(1960));
        let b = Record::new("x", "x", Some(2000));
        let cols = vec!["year".to_string()];
        // |1960 - 2000| * 0.25 = 10, so the single-column score is -9.
        assert_eq!(similarity(&a, &b, &cols, 0.25).unwrap(), -9.0);
    }

    #[test]
    fn test_empty_column_set_is_an_error() {
        let r = Record::new("Radiohead", "OK Computer", Some(1997));
        let err = similarity(&r, &r, &[], 0.25);
        assert!(err.is_err());
        assert!(err
            .unwrap_err()
            .to_string()
            .contains("no comparison columns"));
    }

    #[test]
    fn test_missing_column_fails() {
        let a = Record::new("Slint", "Spiderland", None);
        let b = Record::new("Slint", "Spiderland", Some(1991));
        assert!(similarity(&a, &b, &columns(), 0.25).is_err());
        let bogus = vec!["label".to_string()];
        assert!(similarity(&b, &b, &bogus, 0.25).is_err());
    }

    #[test]
    fn test_bounds_for_string_columns() {
        let cols = vec!["artist".to_string(), "album".to_string()];
        let a = Record::new("Neutral Milk Hotel", "In the Aeroplane Over the Sea", None);
        let b = Record::new("Neutral Milk Hotel", "On Avery Island", None);
        let s = similarity(&a, &b, &cols, 0.25).unwrap();
        assert!((0.0..=1.0).contains(&s));
    }
}
