//! Backup/undo journal.
//!
//! One [`BackupSession`] per mutating operation. Sessions live under
//! `<canonical>/.backups/`; the most recent one that recorded something is
//! what [`undo_last_change`] reverses.

pub mod index;
pub mod prune;
pub mod session;
pub mod undo;

pub use index::{
    find_latest_finalized, find_undoable, BackupEntry, CreatedEntry, JournalKind, SessionIndex,
    SessionState,
};
pub use prune::{prune_sessions, PruneResult};
pub use session::BackupSession;
pub use undo::{undo_last_change, UndoOutcome};

pub(crate) use session::backups_root;
