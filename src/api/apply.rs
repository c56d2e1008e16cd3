//! Link plan applier.
//!
//! Every destructive step goes through the session first: an existing target
//! is moved into the journal before the link is created, and created paths
//! are recorded before they appear on disk.
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::Level;
use serde_json::json;

use super::errors::{id_str, io_at, ApiError};
use crate::constants::DEFAULT_INSTRUCTIONS_TEMPLATE;
use crate::fs::{copy_entry, create_symlink, kind_of, link_text_for, PathKind};
use crate::journal::{BackupSession, JournalKind};
use crate::logging::audit::AuditCtx;
use crate::logging::{now_iso, AuditSink, FactsEmitter, Stage, StageLogger};
use crate::types::ids::{plan_id, task_id};
use crate::types::{EntryKind, LinkApplyReport, LinkPlan, LinkTask};

/// Which conflicting or occupied targets may be replaced.
#[derive(Clone, Debug)]
pub(crate) enum ForceScope {
    Never,
    Always,
    /// Only these target paths (migration origins that were resolved).
    Only(BTreeSet<PathBuf>),
}

impl ForceScope {
    fn covers(&self, target: &Path) -> bool {
        match self {
            ForceScope::Never => false,
            ForceScope::Always => true,
            ForceScope::Only(paths) => paths.contains(target),
        }
    }
}

impl From<bool> for ForceScope {
    fn from(force: bool) -> Self {
        if force {
            ForceScope::Always
        } else {
            ForceScope::Never
        }
    }
}

enum Outcome {
    Applied { backed_up: bool },
    Skipped,
    Conflict,
    Forced { backed_up: bool },
}

impl Outcome {
    const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Applied { .. } => "applied",
            Outcome::Skipped => "skipped",
            Outcome::Conflict => "conflict",
            Outcome::Forced { .. } => "forced",
        }
    }
}

pub(super) fn run<E: FactsEmitter, A: AuditSink>(
    api: &super::Linker<E, A>,
    plan: &LinkPlan,
    force: &ForceScope,
    session: &mut BackupSession,
) -> Result<LinkApplyReport, ApiError> {
    session.ensure_open()?;
    let pid = plan_id(plan);
    let ctx = AuditCtx::new(&api.facts as &dyn FactsEmitter, pid.to_string(), now_iso());
    let slog = StageLogger::new(&ctx);
    let mut report = LinkApplyReport {
        backup_dir: session.dir().to_path_buf(),
        ..LinkApplyReport::default()
    };

    for (idx, task) in plan.tasks.iter().enumerate() {
        let aid = task_id(&pid, task, idx).to_string();
        let outcome = match execute(task, force, session) {
            Ok(o) => o,
            Err(e) => {
                slog.stage(Stage::LinkApply)
                    .action(aid)
                    .path(task.path().display().to_string())
                    .field("task", json!(task.label()))
                    .field("error", json!(e.to_string()))
                    .field("error_id", json!(id_str(e.id())))
                    .emit_failure();
                api.audit.log(
                    Level::Error,
                    &format!("{} {} failed: {e}", task.label(), task.path().display()),
                );
                return Err(e);
            }
        };
        let backed_up = matches!(
            outcome,
            Outcome::Applied { backed_up: true } | Outcome::Forced { backed_up: true }
        );
        match outcome {
            Outcome::Applied { .. } => report.applied += 1,
            Outcome::Skipped => report.skipped += 1,
            Outcome::Conflict => report.conflicts += 1,
            Outcome::Forced { .. } => {
                report.conflicts += 1;
                report.applied += 1;
            }
        }
        report.backed_up += usize::from(backed_up);
        slog.stage(Stage::LinkApply)
            .action(aid)
            .path(task.path().display().to_string())
            .field("task", json!(task.label()))
            .field("outcome", json!(outcome.as_str()))
            .field("backed_up", json!(backed_up))
            .emit_success();
    }

    api.audit.log(
        Level::Info,
        &format!(
            "link: {} applied, {} skipped, {} conflicts, {} backed up",
            report.applied, report.skipped, report.conflicts, report.backed_up
        ),
    );
    Ok(report)
}

fn execute(
    task: &LinkTask,
    force: &ForceScope,
    session: &mut BackupSession,
) -> Result<Outcome, ApiError> {
    match task {
        LinkTask::EnsureSource { path, kind } => ensure_source(path, *kind, session),
        LinkTask::Noop { .. } => Ok(Outcome::Skipped),
        LinkTask::Conflict {
            source,
            target,
            kind: Some(kind),
            ..
        } if force.covers(target) => {
            let backed_up = link_at(source, target, *kind, session)?;
            Ok(Outcome::Forced { backed_up })
        }
        LinkTask::Conflict { .. } => Ok(Outcome::Conflict),
        LinkTask::Link {
            source,
            target,
            kind,
            adopt: true,
            ..
        } => {
            if kind_of(source).exists() || !kind_of(target).matches(*kind) {
                return Ok(Outcome::Skipped);
            }
            seed_source(source, target, *kind, session)?;
            let backed_up = link_at(source, target, *kind, session)?;
            Ok(Outcome::Applied { backed_up })
        }
        LinkTask::Link {
            source,
            target,
            kind,
            replace_symlink,
            ..
        } => {
            // Re-check now: the plan may be stale.
            let present = kind_of(target);
            let proceed = kind_of(source).exists()
                && (!present.exists()
                    || force.covers(target)
                    || (*replace_symlink && present == PathKind::Symlink));
            if !proceed {
                return Ok(Outcome::Skipped);
            }
            let backed_up = link_at(source, target, *kind, session)?;
            Ok(Outcome::Applied { backed_up })
        }
    }
}

fn ensure_source(
    path: &Path,
    kind: EntryKind,
    session: &mut BackupSession,
) -> Result<Outcome, ApiError> {
    if kind_of(path).exists() {
        return Ok(Outcome::Skipped);
    }
    if let Some(parent) = path.parent() {
        session.create_dir_all(parent)?;
    }
    session.record_created_path(path, kind.into())?;
    match kind {
        EntryKind::Dir => fs::create_dir(path).map_err(io_at("create source dir", path))?,
        EntryKind::File => fs::write(path, DEFAULT_INSTRUCTIONS_TEMPLATE)
            .map_err(io_at("create source file", path))?,
    }
    Ok(Outcome::Applied { backed_up: false })
}

/// Copy the client's entry at `target` into the missing canonical `source`.
fn seed_source(
    source: &Path,
    target: &Path,
    kind: EntryKind,
    session: &mut BackupSession,
) -> Result<(), ApiError> {
    if let Some(parent) = source.parent() {
        session.create_dir_all(parent)?;
    }
    session.record_created_path(source, kind.into())?;
    copy_entry(target, source).map_err(io_at("seed source", source))
}

/// Replace whatever is at `target` with a relative link to `source`.
/// Returns whether an existing entry was moved into the journal.
fn link_at(
    source: &Path,
    target: &Path,
    kind: EntryKind,
    session: &mut BackupSession,
) -> Result<bool, ApiError> {
    let backed_up = session.backup_path(target)?;
    if let Some(parent) = target.parent() {
        session.create_dir_all(parent)?;
    }
    if !backed_up {
        session.record_created_path(target, JournalKind::Symlink)?;
    }
    let text = link_text_for(target, source);
    create_symlink(&text, target, kind).map_err(io_at("create symlink", target))?;
    Ok(backed_up)
}
