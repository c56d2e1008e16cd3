//! Public facade: scan, plan, apply and undo against one set of [`Options`].

use std::path::PathBuf;

use log::Level;
use serde_json::json;
use uuid::Uuid;

use crate::config::Options;
use crate::constants::NS_TAG;
use crate::journal::{self, BackupSession, PruneResult};
use crate::logging::audit::AuditCtx;
use crate::logging::{now_iso, AuditSink, FactsEmitter, Stage, StageLogger};
use crate::types::{
    LinkApplyReport, LinkPlan, MigrationApplyReport, MigrationPlan, Selections, UndoReport,
};

mod apply;
pub mod errors;
mod migrate;
mod plan;
mod undo;

use errors::ApiError;

pub struct Linker<E: FactsEmitter, A: AuditSink> {
    facts: E,
    audit: A,
    options: Options,
}

impl<E: FactsEmitter, A: AuditSink> Linker<E, A> {
    pub fn new(facts: E, audit: A, options: Options) -> Self {
        Self {
            facts,
            audit,
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Gather per-client content that would move into the canonical tree.
    pub fn scan_migration(&self) -> MigrationPlan {
        migrate::scan::run(self)
    }

    /// Copy auto and selected candidates, then link every enabled client.
    ///
    /// # Errors
    ///
    /// `SessionClosed` if `session` was already finalized; `Filesystem` on the
    /// first failed mutation. The journal stays valid up to that point:
    /// finalize the session anyway and undo can reverse the partial run.
    pub fn apply_migration(
        &self,
        plan: &MigrationPlan,
        selections: &Selections,
        session: &mut BackupSession,
    ) -> Result<MigrationApplyReport, ApiError> {
        migrate::apply::run(self, plan, selections, session)
    }

    /// Compute the link plan from the current filesystem state.
    ///
    /// # Errors
    ///
    /// `InvalidMapping` if a mapping cannot be built for the configured roots.
    pub fn build_link_plan(&self) -> Result<LinkPlan, ApiError> {
        let mappings = crate::clients::mappings(&self.options)?;
        Ok(plan::build(self, &mappings))
    }

    /// Execute `plan`. With `force`, conflicting targets that carry a kind
    /// are replaced (after being journaled).
    ///
    /// # Errors
    ///
    /// `SessionClosed` if `session` was already finalized; `Filesystem` on the
    /// first failed mutation.
    pub fn apply_link_plan(
        &self,
        plan: &LinkPlan,
        force: bool,
        session: &mut BackupSession,
    ) -> Result<LinkApplyReport, ApiError> {
        apply::run(self, plan, &apply::ForceScope::from(force), session)
    }

    /// Open a journal session under the canonical tree.
    pub fn open_session(&self) -> Result<BackupSession, ApiError> {
        BackupSession::open(self.options.canonical_root())
    }

    /// Finalize `session` so the next undo can find it, then prune old
    /// sessions. Returns the session directory, or `None` when the session
    /// recorded nothing and was discarded.
    pub fn finalize(&self, session: &mut BackupSession) -> Result<Option<PathBuf>, ApiError> {
        let dir = session.finalize()?;
        let ctx = self.ctx("finalize");
        let slog = StageLogger::new(&ctx);
        slog.stage(Stage::JournalFinalize)
            .path(session.dir().display().to_string())
            .field("kept", json!(dir.is_some()))
            .field("created", json!(session.created().len()))
            .field("backed_up", json!(session.backed_up().len()))
            .emit_success();
        if dir.is_some() {
            // The session itself is already durable; a failed prune only warns.
            if let Err(e) = self.prune_sessions() {
                self.audit.log(Level::Warn, &format!("pruning backups failed: {e}"));
            }
        }
        Ok(dir)
    }

    /// Delete undone sessions and finalized sessions beyond the retention limit.
    pub fn prune_sessions(&self) -> Result<PruneResult, ApiError> {
        let root = journal::backups_root(self.options.canonical_root());
        let keep = self.options.backups.keep;
        let ctx = self.ctx("prune");
        let ev = StageLogger::new(&ctx)
            .stage(Stage::PruneResult)
            .path(root.display().to_string())
            .field("retention_count_limit", json!(keep));
        match journal::prune_sessions(&root, keep) {
            Ok(res) => {
                ev.field("pruned_count", json!(res.pruned_count))
                    .field("retained_count", json!(res.retained_count))
                    .emit_success();
                Ok(res)
            }
            Err(e) => {
                let err = ApiError::Filesystem {
                    op: "prune backups",
                    path: root,
                    source: e,
                };
                ev.field("error", json!(err.to_string()))
                    .field("error_id", json!(errors::id_str(err.id())))
                    .emit_failure();
                Err(err)
            }
        }
    }

    /// Reverse the most recent session, including one left open by a failed
    /// apply. With nothing to undo (or the newest session already undone)
    /// the report is all zeros.
    pub fn undo_last_change(&self) -> Result<UndoReport, ApiError> {
        undo::run(self)
    }

    /// Audit context with a stable id per operation and canonical root.
    fn ctx(&self, op: &str) -> AuditCtx<'_> {
        let ns = Uuid::new_v5(&Uuid::NAMESPACE_URL, NS_TAG.as_bytes());
        let key = format!("{op}:{}", self.options.canonical_root().display());
        AuditCtx::new(
            &self.facts as &dyn FactsEmitter,
            Uuid::new_v5(&ns, key.as_bytes()).to_string(),
            now_iso(),
        )
    }
}
