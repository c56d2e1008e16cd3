use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::mapping::EntryKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateAction {
    Copy,
    /// Leave the canonical entry as it is.
    Keep,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MigrationCandidate {
    pub label: String,
    pub target_path: PathBuf,
    pub kind: EntryKind,
    pub action: CandidateAction,
    /// Content to copy; `None` for keep candidates.
    pub source_path: Option<PathBuf>,
    /// Client location the candidate was scanned from (a mapping target).
    pub origin: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MigrationConflict {
    pub label: String,
    pub target_path: PathBuf,
    /// Keep candidate first when canonical content already exists.
    pub candidates: Vec<MigrationCandidate>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MigrationPlan {
    pub auto: Vec<MigrationCandidate>,
    pub conflicts: Vec<MigrationConflict>,
    pub canonical_root: PathBuf,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.auto.is_empty() && self.conflicts.is_empty()
    }
}

/// Operator choices: conflict target path to candidate index.
pub type Selections = BTreeMap<PathBuf, usize>;
