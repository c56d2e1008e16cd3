use std::path::{Path, PathBuf};

use serde::Serialize;

use super::mapping::EntryKind;

/// One planned step for a mapping source or a single (mapping, target) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LinkTask {
    /// Canonical source is absent and must be created.
    EnsureSource { path: PathBuf, kind: EntryKind },
    /// Target must become a relative symlink to `source`.
    Link {
        source: PathBuf,
        target: PathBuf,
        kind: EntryKind,
        /// Target is currently a symlink that gets replaced.
        replace_symlink: bool,
        /// Source does not exist yet: the target is the only copy of this
        /// entry, so its content seeds the source before being linked.
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        adopt: bool,
    },
    /// Target (or source) is in a state the planner will not touch on its own.
    /// `kind` is `None` for source-kind mismatches, which are never forced.
    Conflict {
        source: PathBuf,
        target: PathBuf,
        reason: String,
        kind: Option<EntryKind>,
    },
    /// Target already is the link that would be created.
    Noop { source: PathBuf, target: PathBuf },
}

impl LinkTask {
    /// Path the task would act upon.
    pub fn path(&self) -> &Path {
        match self {
            LinkTask::EnsureSource { path, .. } => path,
            LinkTask::Link { target, .. }
            | LinkTask::Conflict { target, .. }
            | LinkTask::Noop { target, .. } => target,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            LinkTask::EnsureSource { .. } => "ensure-source",
            LinkTask::Link { .. } => "link",
            LinkTask::Conflict { .. } => "conflict",
            LinkTask::Noop { .. } => "noop",
        }
    }

    #[must_use]
    pub const fn is_change(&self) -> bool {
        matches!(self, LinkTask::EnsureSource { .. } | LinkTask::Link { .. })
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LinkPlan {
    /// Ordered; each mapping's ensure-source precedes its targets.
    pub tasks: Vec<LinkTask>,
    pub changes: Vec<LinkTask>,
    pub conflicts: Vec<LinkTask>,
}

impl LinkPlan {
    #[must_use]
    pub fn from_tasks(tasks: Vec<LinkTask>) -> Self {
        let changes = tasks.iter().filter(|t| t.is_change()).cloned().collect();
        let conflicts = tasks
            .iter()
            .filter(|t| matches!(t, LinkTask::Conflict { .. }))
            .cloned()
            .collect();
        Self {
            tasks,
            changes,
            conflicts,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.changes.is_empty() && self.conflicts.is_empty()
    }
}
