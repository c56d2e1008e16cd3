#![forbid(unsafe_code)]
//! canonlink: one canonical agent-configuration tree, projected into every
//! client's layout through relative symlinks.
//!
//! Safety model highlights:
//! - Planning is read-only; applying re-checks the one destructive case
//!   (replacing an existing symlink) right before acting.
//! - Every mutating call takes a `&mut BackupSession`: whatever a task would
//!   destroy is moved into the session first, whatever it creates is recorded,
//!   so `undo_last_change` can reverse the whole operation.
//! - Symlinks are created atomically (stage under a temporary name, then
//!   `renameat` over the final component) and store paths relative to their
//!   own directory, so a tree can be moved or cloned without breaking links.

pub mod api;
pub mod clients;
pub mod config;
pub mod constants;
pub mod fs;
pub mod journal;
pub mod logging;
pub mod types;

pub use api::errors::{exit_code_for, id_str, ApiError, ErrorId};
pub use api::Linker;
pub use clients::{Client, Roots, Scope};
pub use config::{BackupRetention, Config, Options};
pub use journal::BackupSession;
