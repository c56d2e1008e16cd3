use std::fs;
use std::io;
use std::path::Path;

use super::index::{list_sessions, SessionState};
use crate::constants::UNDONE_DIR;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneResult {
    pub pruned_count: usize,
    pub retained_count: usize,
}

/// Prune journal sessions under `backups_root`.
///
/// Retention semantics:
/// - every archived (undone) session is deleted;
/// - finalized sessions beyond the newest `keep` are deleted; `keep` is clamped
///   to at least 1, so the newest finalized session always survives;
/// - open sessions (an operation that never finalized) are left alone.
pub fn prune_sessions(backups_root: &Path, keep: usize) -> io::Result<PruneResult> {
    let mut result = PruneResult::default();
    let archive = backups_root.join(UNDONE_DIR);
    if archive.is_dir() {
        for entry in fs::read_dir(&archive)?.flatten() {
            fs::remove_dir_all(entry.path())?;
            result.pruned_count += 1;
        }
    }

    let keep = keep.max(1);
    let mut finalized_seen = 0usize;
    for (dir, index) in list_sessions(backups_root) {
        if index.state != SessionState::Finalized {
            result.retained_count += 1;
            continue;
        }
        finalized_seen += 1;
        if finalized_seen > keep {
            fs::remove_dir_all(&dir)?;
            result.pruned_count += 1;
        } else {
            result.retained_count += 1;
        }
    }
    Ok(result)
}
