use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{Error, ErrorKind, Result};
use super::safepath::SafePath;

/// What a canonical entry is expected to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Dir => "dir",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a mapping's source reaches its targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    /// Each target is one link to the source itself.
    Whole,
    /// Source and targets are directories; every child of kind `entry`
    /// gets its own link inside each target directory.
    Entries { entry: EntryKind },
}

/// One canonical entry and the client paths that should link to it.
#[derive(Clone, Debug)]
pub struct Mapping {
    pub name: String,
    pub source: SafePath,
    pub targets: Vec<PathBuf>,
    pub kind: EntryKind,
    pub projection: Projection,
    /// Legacy canonical siblings a target may still point at; such links are
    /// re-pointed at `source` instead of being reported as conflicts.
    pub relinkable: Vec<PathBuf>,
}

impl Mapping {
    /// Build a mapping, checking that `source` sits under `canonical_root` and
    /// that at least one target is present.
    pub fn new(
        name: impl Into<String>,
        canonical_root: &Path,
        source: &Path,
        kind: EntryKind,
        targets: Vec<PathBuf>,
    ) -> Result<Self> {
        let name = name.into();
        let source = SafePath::from_rooted(canonical_root, source)?;
        if targets.is_empty() {
            return Err(Error::new(
                ErrorKind::Policy,
                format!("mapping {name} has no targets"),
            ));
        }
        Ok(Self {
            name,
            source,
            targets,
            kind,
            projection: Projection::Whole,
            relinkable: Vec::new(),
        })
    }

    /// Project the children of this directory mapping one by one.
    pub fn per_entry(mut self, entry: EntryKind) -> Result<Self> {
        if self.kind != EntryKind::Dir {
            return Err(Error::new(
                ErrorKind::Policy,
                format!("mapping {} projects entries but is not a directory", self.name),
            ));
        }
        self.projection = Projection::Entries { entry };
        Ok(self)
    }

    #[must_use]
    pub fn with_relinkable(mut self, relinkable: Vec<PathBuf>) -> Self {
        self.relinkable = relinkable;
        self
    }

    pub fn source_path(&self) -> PathBuf {
        self.source.as_path()
    }
}
