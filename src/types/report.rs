use std::path::PathBuf;

use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LinkApplyReport {
    pub applied: usize,
    pub skipped: usize,
    pub conflicts: usize,
    pub backed_up: usize,
    pub backup_dir: PathBuf,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MigrationApplyReport {
    pub copied: usize,
    pub skipped: usize,
    pub backup_dir: PathBuf,
    pub links: LinkApplyReport,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UndoReport {
    pub restored_backups: usize,
    pub removed_created: usize,
    pub removed_symlinks: usize,
    pub backup_dir: Option<PathBuf>,
    pub undone_dir: Option<PathBuf>,
}
