//! Core data model: one album entry as a typed record.
//!
//! Records are constructed once at the collaborator boundary (whatever
//! scraped or loaded them) and treated as immutable value data inside the
//! matching core. Field access is strict: asking for a column a record does
//! not carry is a hard schema error, never a silent skip.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Extra field value carried alongside the typed album columns
/// (scores, ratings, track counts and the like).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Borrowed view of a single column used by the similarity scorer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Field<'a> {
    Str(&'a str),
    Num(f64),
}

/// One album entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Canonical derived id; empty until assigned (see [`crate::ident`]).
    #[serde(default)]
    pub id: String,
    /// Opaque identifier assigned by the origin site, if downloaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    pub artist: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    /// Remaining schema columns (user scores, ratings, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(artist: impl Into<String>, album: impl Into<String>, year: Option<i64>) -> Self {
        Self {
            id: String::new(),
            internal_id: None,
            artist: artist.into(),
            album: album.into(),
            year,
            extra: BTreeMap::new(),
        }
    }

    /// Look up a comparison column. `title` is accepted as an alias for
    /// `album` since sources disagree on the name.
    pub fn field(&self, column: &str) -> Result<Field<'_>> {
        match column {
            "artist" => Ok(Field::Str(&self.artist)),
            "album" | "title" => Ok(Field::Str(&self.album)),
            "year" => match self.year {
                Some(y) => Ok(Field::Num(y as f64)),
                None => bail!("record «{self}» has no year"),
            },
            "id" => Ok(Field::Str(&self.id)),
            "internal_id" => match &self.internal_id {
                Some(i) => Ok(Field::Str(i)),
                None => bail!("record «{self}» has no internal_id"),
            },
            other => match self.extra.get(other) {
                Some(Value::Str(s)) => Ok(Field::Str(s)),
                Some(Value::Int(i)) => Ok(Field::Num(*i as f64)),
                Some(Value::Float(f)) => Ok(Field::Num(*f)),
                None => bail!("record «{self}» has no column '{other}'"),
            },
        }
    }

    /// String form of a column, matching how numeric fields are coerced when
    /// compared against a string on the other side.
    pub fn field_str(&self, column: &str) -> Result<String> {
        Ok(match self.field(column)? {
            Field::Str(s) => s.to_string(),
            Field::Num(n) => {
                if n.fract() == 0.0 {
                    format!("{}", n as i64)
                } else {
                    format!("{n}")
                }
            }
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(y) => write!(f, "{} - {} ({})", self.artist, self.album, y),
            None => write!(f, "{} - {}", self.artist, self.album),
        }
    }
}
