//! On-disk session index: what a session created and what it moved away.
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{SESSION_INDEX, SESSION_SCHEMA, UNDONE_DIR};
use crate::fs::atomic::fsync_parent_dir;
use crate::fs::PathKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Open,
    Finalized,
    Undone,
    /// Closed without recording anything; never written to disk.
    Discarded,
}

/// Node kind as recorded in the journal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalKind {
    File,
    Dir,
    Symlink,
}

impl JournalKind {
    /// `None` when nothing exists at the given path.
    #[must_use]
    pub fn from_path_kind(kind: PathKind) -> Option<Self> {
        match kind {
            PathKind::Missing => None,
            PathKind::Dir => Some(JournalKind::Dir),
            PathKind::Symlink => Some(JournalKind::Symlink),
            PathKind::File | PathKind::Other => Some(JournalKind::File),
        }
    }
}

impl From<crate::types::EntryKind> for JournalKind {
    fn from(k: crate::types::EntryKind) -> Self {
        match k {
            crate::types::EntryKind::File => JournalKind::File,
            crate::types::EntryKind::Dir => JournalKind::Dir,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEntry {
    pub path: PathBuf,
    pub kind: JournalKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub original: PathBuf,
    pub backup: PathBuf,
    pub kind: JournalKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_hash: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIndex {
    pub schema: String,
    pub state: SessionState,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undone_at: Option<String>,
    #[serde(default)]
    pub created: Vec<CreatedEntry>,
    #[serde(default)]
    pub backed_up: Vec<BackupEntry>,
}

impl SessionIndex {
    pub(crate) fn new(started_at: String) -> Self {
        Self {
            schema: SESSION_SCHEMA.to_string(),
            state: SessionState::Open,
            started_at,
            finalized_at: None,
            undone_at: None,
            created: Vec::new(),
            backed_up: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.backed_up.is_empty()
    }
}

pub(crate) fn index_path(session_dir: &Path) -> PathBuf {
    session_dir.join(SESSION_INDEX)
}

/// Write the index via a temporary file and rename, so a reader never sees
/// a truncated index.
pub(crate) fn write_index(session_dir: &Path, index: &SessionIndex) -> io::Result<()> {
    let path = index_path(session_dir);
    let tmp = session_dir.join(format!("{SESSION_INDEX}.tmp"));
    let f = fs::File::create(&tmp)?;
    serde_json::to_writer_pretty(&f, index).map_err(io::Error::other)?;
    let _ = f.sync_all();
    fs::rename(&tmp, &path)?;
    let _ = fsync_parent_dir(&path);
    Ok(())
}

pub(crate) fn read_index(session_dir: &Path) -> io::Result<SessionIndex> {
    let f = fs::File::open(index_path(session_dir))?;
    serde_json::from_reader(f).map_err(io::Error::other)
}

/// All session directories under `backups_root` with a readable index,
/// newest first. The `undone` archive is skipped.
pub(crate) fn list_sessions(backups_root: &Path) -> Vec<(PathBuf, SessionIndex)> {
    let Ok(rd) = fs::read_dir(backups_root) else {
        return Vec::new();
    };
    let mut out: Vec<(PathBuf, SessionIndex)> = rd
        .flatten()
        .filter(|e| e.file_name() != UNDONE_DIR)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let dir = e.path();
            read_index(&dir).ok().map(|idx| (dir, idx))
        })
        .collect();
    out.sort_by(|a, b| b.0.file_name().cmp(&a.0.file_name()));
    out
}

/// Most recent session in the `finalized` state.
pub fn find_latest_finalized(backups_root: &Path) -> Option<(PathBuf, SessionIndex)> {
    list_sessions(backups_root)
        .into_iter()
        .find(|(_, idx)| idx.state == SessionState::Finalized)
}

/// Name of the newest session already moved into the `undone` archive.
fn latest_undone_name(backups_root: &Path) -> Option<OsString> {
    fs::read_dir(backups_root.join(UNDONE_DIR))
        .ok()?
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name())
        .max()
}

/// The session undo should consume: the newest recorded session, unless a
/// newer one has already been undone.
///
/// An `open` session that recorded something belongs to an operation that
/// failed before finalizing; it is undoable like a finalized one. Empty open
/// sessions are ignored.
pub fn find_undoable(backups_root: &Path) -> Option<(PathBuf, SessionIndex)> {
    let (dir, index) = list_sessions(backups_root)
        .into_iter()
        .find(|(_, idx)| match idx.state {
            SessionState::Finalized => true,
            SessionState::Open => !idx.is_empty(),
            SessionState::Undone | SessionState::Discarded => false,
        })?;
    let name = dir.file_name()?.to_os_string();
    match latest_undone_name(backups_root) {
        Some(undone) if undone > name => None,
        _ => Some((dir, index)),
    }
}
