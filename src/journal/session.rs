//! A backup session: the journal handle every mutating call must hold.
//!
//! Destroyed paths are moved (not copied) into a timestamped, session-private
//! directory under the canonical tree; newly created paths are only recorded.
//! The index is rewritten before each move, so a failure part-way through an
//! operation still leaves a journal that undo can consume once finalized.
use std::fs;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;

use super::index::{write_index, BackupEntry, CreatedEntry, JournalKind, SessionIndex, SessionState};
use crate::api::errors::{io_at, ApiError};
use crate::constants::{BACKUPS_DIR, PAYLOAD_DIR};
use crate::fs::{kind_of, move_entry, remove_entry, sha256_hex_of};
use crate::logging::now_iso;

#[derive(Debug)]
pub struct BackupSession {
    dir: PathBuf,
    index: SessionIndex,
}

/// Filesystem-safe, lexically sortable timestamp, e.g. `2026-10-18T09-41-07-512Z`.
fn session_stamp() -> String {
    let fmt = format_description!(
        "[year]-[month]-[day]T[hour]-[minute]-[second]-[subsecond digits:3]Z"
    );
    OffsetDateTime::now_utc()
        .format(&fmt)
        .unwrap_or_else(|_| "1970-01-01T00-00-00-000Z".to_string())
}

pub(crate) fn backups_root(canonical_root: &Path) -> PathBuf {
    canonical_root.join(BACKUPS_DIR)
}

impl BackupSession {
    /// Open a new session under `<canonical_root>/.backups/<timestamp>/`.
    pub fn open(canonical_root: &Path) -> Result<Self, ApiError> {
        let root = backups_root(canonical_root);
        fs::create_dir_all(&root).map_err(io_at("create backups dir", &root))?;
        let stamp = session_stamp();
        let mut dir = root.join(&stamp);
        let mut bump = 0u32;
        while dir.exists() {
            bump += 1;
            dir = root.join(format!("{stamp}-{bump}"));
        }
        fs::create_dir(&dir).map_err(io_at("create session dir", &dir))?;
        let index = SessionIndex::new(now_iso());
        write_index(&dir, &index).map_err(io_at("write session index", &dir))?;
        Ok(Self { dir, index })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_open(&self) -> bool {
        self.index.state == SessionState::Open
    }

    pub fn created(&self) -> &[CreatedEntry] {
        &self.index.created
    }

    pub fn backed_up(&self) -> &[BackupEntry] {
        &self.index.backed_up
    }

    pub(crate) fn ensure_open(&self) -> Result<(), ApiError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ApiError::SessionClosed(self.dir.clone()))
        }
    }

    fn persist(&self) -> Result<(), ApiError> {
        write_index(&self.dir, &self.index).map_err(io_at("write session index", &self.dir))
    }

    fn was_created_here(&self, path: &Path) -> bool {
        self.index.created.iter().any(|c| path.starts_with(&c.path))
    }

    /// Move whatever exists at `path` into the session, preserving its kind.
    ///
    /// Returns whether a backup was taken. Absent paths are a no-op. Content
    /// this session created itself is removed instead of backed up, since
    /// undo deletes it anyway.
    pub fn backup_path(&mut self, path: &Path) -> Result<bool, ApiError> {
        self.ensure_open()?;
        let Some(kind) = JournalKind::from_path_kind(kind_of(path)) else {
            return Ok(false);
        };
        if self.was_created_here(path) {
            remove_entry(path).map_err(io_at("remove", path))?;
            return Ok(false);
        }

        let payload_dir = self.dir.join(PAYLOAD_DIR);
        fs::create_dir_all(&payload_dir).map_err(io_at("create payload dir", &payload_dir))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "entry".to_string());
        let backup = payload_dir.join(format!("{:04}-{name}", self.index.backed_up.len()));
        let payload_hash = match kind {
            JournalKind::File => sha256_hex_of(path),
            JournalKind::Dir | JournalKind::Symlink => None,
        };

        self.index.backed_up.push(BackupEntry {
            original: path.to_path_buf(),
            backup: backup.clone(),
            kind,
            payload_hash,
        });
        self.persist()?;
        if let Err(e) = move_entry(path, &backup) {
            self.index.backed_up.pop();
            self.persist()?;
            return Err(io_at("backup", path)(e));
        }
        Ok(true)
    }

    /// Record a path this operation created, so undo deletes rather than restores it.
    pub fn record_created_path(&mut self, path: &Path, kind: JournalKind) -> Result<(), ApiError> {
        self.ensure_open()?;
        if self.index.created.iter().any(|c| c.path == path) {
            return Ok(());
        }
        self.index.created.push(CreatedEntry {
            path: path.to_path_buf(),
            kind,
        });
        self.persist()
    }

    /// `create_dir_all` that records every directory it actually creates.
    pub fn create_dir_all(&mut self, dir: &Path) -> Result<(), ApiError> {
        self.ensure_open()?;
        let mut missing: Vec<&Path> = Vec::new();
        let mut cur = Some(dir);
        while let Some(p) = cur {
            if kind_of(p).exists() {
                break;
            }
            missing.push(p);
            cur = p.parent();
        }
        for p in missing.into_iter().rev() {
            fs::create_dir(p).map_err(io_at("create dir", p))?;
            self.record_created_path(p, JournalKind::Dir)?;
        }
        Ok(())
    }

    /// Persist the session for a later undo. A session that recorded nothing
    /// is discarded and `None` is returned.
    pub fn finalize(&mut self) -> Result<Option<PathBuf>, ApiError> {
        self.ensure_open()?;
        if self.index.is_empty() {
            self.index.state = SessionState::Discarded;
            fs::remove_dir_all(&self.dir).map_err(io_at("discard empty session", &self.dir))?;
            return Ok(None);
        }
        self.index.state = SessionState::Finalized;
        self.index.finalized_at = Some(now_iso());
        self.persist()?;
        Ok(Some(self.dir.clone()))
    }
}
