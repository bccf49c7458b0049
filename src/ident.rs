//! Identity Normalizer: canonical album ids.
//!
//! Derives a compact, ASCII-folded id from (artist, year, album) so that two
//! downloads of the same album collapse to the same key regardless of
//! diacritics, punctuation or subtitle formatting. The derivation is a pure
//! function: same record in, same id out, every time.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::ID_SEP;
use crate::record::Record;

/// Leading article: "The Beatles" → "Beatles".
static LEADING_ARTICLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Tt]he ").unwrap());

/// Trailing EP marker: "Tour de France EP" → "Tour de France".
static EP_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r" EP$").unwrap());

/// Colon-introduced subtitle prefix; greedy, so only the text after the
/// last ": " survives.
static SUBTITLE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*: ").unwrap());

/// Check if a character is a Unicode combining mark (diacritical mark).
fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold to ASCII via NFKD decomposition, discarding combining marks and any
/// non-ASCII remainder. e.g. "Björk" → "Bjork", "Sigur Rós" → "Sigur Ros".
fn fold_to_ascii(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c) && c.is_ascii())
        .collect()
}

/// Normalize one id fragment: strip noise patterns, fold to ASCII, keep
/// alphanumerics only, lowercase, truncate.
fn fragment(field: &str, id_length: usize) -> String {
    let mut s = LEADING_ARTICLE.replace(field, "").into_owned();
    s = EP_SUFFIX.replace(&s, "").into_owned();
    s = SUBTITLE_PREFIX.replace(&s, "").into_owned();
    fold_to_ascii(&s)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(id_length)
        .collect::<String>()
        .to_lowercase()
}

/// Derive the canonical id for a record from (artist, year, album), in that
/// order. Absent or empty fields are skipped without a placeholder, so a
/// record with no usable fields yields the empty string; callers must treat
/// that as "no identity", not as a valid key.
pub fn compute_id(record: &Record, id_length: usize) -> String {
    let year = record.year.map(|y| y.to_string());
    let fields = [
        Some(record.artist.as_str()),
        year.as_deref(),
        Some(record.album.as_str()),
    ];
    fields
        .iter()
        .flatten()
        .map(|f| fragment(f, id_length))
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(ID_SEP)
}

/// Assign ids in place.
pub fn assign_ids(records: &mut [Record], id_length: usize) {
    for record in records {
        record.id = compute_id(record, id_length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_id_basic() {
        let r = Record::new("The Beatles", "Abbey Road", Some(1969));
        assert_eq!(compute_id(&r, 14), "beatles-1969-abbeyroad");
    }

    #[test]
    fn test_compute_id_deterministic() {
        let r = Record::new("Radiohead", "OK Computer", Some(1997));
        let first = compute_id(&r, 22);
        assert_eq!(first, compute_id(&r, 22));
        assert_eq!(first, "radiohead-1997-okcomputer");
    }

    #[test]
    fn test_diacritics_folded() {
        let r = Record::new("Björk", "Homogenic", Some(1997));
        assert_eq!(compute_id(&r, 22), "bjork-1997-homogenic");
        let r = Record::new("Sigur Rós", "Ágætis byrjun", Some(1999));
        assert_eq!(compute_id(&r, 22), "sigurros-1999-agtisbyrjun");
    }

    #[test]
    fn test_subtitle_and_ep_stripped() {
        let r = Record::new("GY!BE", "Slow Riot: New Zero Kanada EP", Some(1999));
        assert_eq!(compute_id(&r, 22), "gybe-1999-newzerokanada");
    }

    #[test]
    fn test_truncation() {
        let r = Record::new(
            "The Brian Jonestown Massacre",
            "Their Satanic Majesties' Second Request",
            Some(1996),
        );
        assert_eq!(
            compute_id(&r, 10),
            "brianjones-1996-theirsatan"
        );
    }

    #[test]
    fn test_missing_fields_skipped() {
        let r = Record::new("Slint", "Spiderland", None);
        assert_eq!(compute_id(&r, 22), "slint-spiderland");
    }

    #[test]
    fn test_degenerate_empty_identity() {
        let r = Record::new("", "", None);
        assert_eq!(compute_id(&r, 22), "");
    }

    #[test]
    fn test_assign_ids() {
        let mut records = vec![
            Record::new("Low", "Things We Lost in the Fire", Some(2001)),
            Record::new("", "", None),
        ];
        assign_ids(&mut records, 22);
        assert_eq!(records[0].id, "low-2001-thingswelostinthefire");
        assert_eq!(records[1].id, "");
    }
}
