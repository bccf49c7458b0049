//! On-disk layout for collections and ledgers.
//!
//! Each location category gets its own directory under the data root, and
//! every named table is a JSON file of rows. The encoding is deliberately
//! dumb: this is the collaborator boundary, not the interesting part.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Where a named table lives, mirroring how it was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Download,
    Merge,
    Diff,
    Dedup,
}

impl Location {
    pub fn dir(self) -> &'static str {
        match self {
            Location::Download => "download",
            Location::Merge => "merge",
            Location::Diff => "diff",
            Location::Dedup => "dedup",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

/// Root of the data tree.
#[derive(Clone, Debug)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, name: &str, location: Location) -> PathBuf {
        self.root.join(location.dir()).join(format!("{name}.json"))
    }

    pub fn exists(&self, name: &str, location: Location) -> bool {
        self.path(name, location).is_file()
    }

    /// Read a table. A missing file is the caller's concern (check
    /// [`DataStore::exists`] first); a present but unparseable file is a
    /// fatal condition and surfaces as an error.
    pub fn read<T: DeserializeOwned>(&self, name: &str, location: Location) -> Result<T> {
        let path = self.path(name, location);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("couldn't read {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("couldn't parse {}", path.display()))
    }

    /// Write a table, creating the location directory on first use.
    pub fn write<T: Serialize>(&self, name: &str, location: Location, rows: &T) -> Result<()> {
        let path = self.path(name, location);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("couldn't create {}", dir.display()))?;
        }
        let data = serde_json::to_string_pretty(rows)?;
        fs::write(&path, data).with_context(|| format!("couldn't write {}", path.display()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
