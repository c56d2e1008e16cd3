//! Reversal of the most recent recorded session.
use std::fs;
use std::path::Path;

use super::index::{find_undoable, write_index, JournalKind, SessionIndex, SessionState};
use super::session::backups_root;
use crate::api::errors::{io_at, ApiError};
use crate::constants::UNDONE_DIR;
use crate::fs::{kind_of, move_entry, remove_entry, sha256_hex_of};
use crate::logging::now_iso;
use crate::types::UndoReport;

/// Result of an undo pass plus anything worth warning about.
#[derive(Debug, Default)]
pub struct UndoOutcome {
    pub report: UndoReport,
    /// Backups whose payload was missing or whose hash no longer matched.
    pub warnings: Vec<String>,
}

/// Undo the latest session under `canonical_root` (see [`find_undoable`]).
///
/// Created entries are removed newest first (links are unlinked, never
/// followed), then backups are moved back over whatever now occupies their
/// original path, newest first. The session is then marked `undone` and
/// archived, so a second call without an intervening apply finds nothing,
/// even when older sessions remain.
pub fn undo_last_change(canonical_root: &Path) -> Result<UndoOutcome, ApiError> {
    let root = backups_root(canonical_root);
    let Some((dir, mut index)) = find_undoable(&root) else {
        return Ok(UndoOutcome::default());
    };
    validate(&dir, &index)?;
    let mut out = UndoOutcome::default();
    out.report.backup_dir = Some(dir.clone());

    for entry in index.created.iter().rev() {
        if remove_entry(&entry.path).map_err(io_at("remove created", &entry.path))? {
            match entry.kind {
                JournalKind::Symlink => out.report.removed_symlinks += 1,
                JournalKind::File | JournalKind::Dir => out.report.removed_created += 1,
            }
        }
    }

    for entry in index.backed_up.iter().rev() {
        if !kind_of(&entry.backup).exists() {
            out.warnings.push(format!(
                "backup payload missing for {}: {}",
                entry.original.display(),
                entry.backup.display()
            ));
            continue;
        }
        if let Some(expected) = &entry.payload_hash {
            if sha256_hex_of(&entry.backup).as_ref() != Some(expected) {
                out.warnings.push(format!(
                    "backup payload hash mismatch for {}",
                    entry.original.display()
                ));
            }
        }
        if let Some(parent) = entry.original.parent() {
            fs::create_dir_all(parent).map_err(io_at("create dir", parent))?;
        }
        remove_entry(&entry.original).map_err(io_at("clear restore target", &entry.original))?;
        move_entry(&entry.backup, &entry.original).map_err(io_at("restore", &entry.original))?;
        out.report.restored_backups += 1;
    }

    index.state = SessionState::Undone;
    index.undone_at = Some(now_iso());
    write_index(&dir, &index).map_err(io_at("write session index", &dir))?;

    let archive = root.join(UNDONE_DIR);
    fs::create_dir_all(&archive).map_err(io_at("create undone dir", &archive))?;
    let name = dir.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    let undone = archive.join(name);
    fs::rename(&dir, &undone).map_err(io_at("archive session", &dir))?;
    out.report.undone_dir = Some(undone);
    Ok(out)
}

/// Refuse an index that would make undo touch paths it never owned: every
/// recorded path must be absolute and every payload must sit in the session.
fn validate(dir: &Path, index: &SessionIndex) -> Result<(), ApiError> {
    let bad = |what: &str, p: &Path| {
        ApiError::Journal(format!(
            "session {}: {what} {}",
            dir.display(),
            p.display()
        ))
    };
    for c in &index.created {
        if !c.path.is_absolute() {
            return Err(bad("created path is not absolute:", &c.path));
        }
    }
    for b in &index.backed_up {
        if !b.original.is_absolute() {
            return Err(bad("backed-up path is not absolute:", &b.original));
        }
        if !b.backup.starts_with(dir) {
            return Err(bad("payload outside the session:", &b.backup));
        }
    }
    Ok(())
}
