use std::collections::BTreeSet;
use std::path::PathBuf;

use log::Level;
use serde_json::json;

use crate::api::apply::ForceScope;
use crate::api::errors::{id_str, io_at, ApiError};
use crate::fs::copy_entry;
use crate::journal::BackupSession;
use crate::logging::{AuditSink, FactsEmitter, Stage, StageLogger};
use crate::types::{
    CandidateAction, MigrationApplyReport, MigrationCandidate, MigrationPlan, Selections,
};

/// Copy auto candidates and selected conflict candidates into the canonical
/// tree, then project the result with a fresh link plan.
///
/// Client locations whose content was settled (copied, or explicitly kept
/// over) are force-linked; everything else is linked only where nothing is
/// in the way.
pub(in crate::api) fn run<E: FactsEmitter, A: AuditSink>(
    api: &crate::api::Linker<E, A>,
    plan: &MigrationPlan,
    selections: &Selections,
    session: &mut BackupSession,
) -> Result<MigrationApplyReport, ApiError> {
    session.ensure_open()?;
    let ctx = api.ctx("migrate");
    let slog = StageLogger::new(&ctx);
    let mut report = MigrationApplyReport {
        backup_dir: session.dir().to_path_buf(),
        ..MigrationApplyReport::default()
    };
    let mut settled: BTreeSet<PathBuf> = BTreeSet::new();

    let copy = |c: &MigrationCandidate, session: &mut BackupSession| {
        let res = copy_candidate(c, session);
        let ev = slog
            .stage(Stage::MigrateApply)
            .path(c.target_path.display().to_string())
            .field("candidate", json!(c.label));
        match &res {
            Ok(()) => ev.emit_success(),
            Err(e) => ev
                .field("error", json!(e.to_string()))
                .field("error_id", json!(id_str(e.id())))
                .emit_failure(),
        }
        res
    };

    for c in &plan.auto {
        copy(c, session)?;
        report.copied += 1;
        settled.extend(c.origin.clone());
    }

    for conflict in &plan.conflicts {
        let chosen = selections
            .get(&conflict.target_path)
            .and_then(|&i| conflict.candidates.get(i));
        match chosen {
            Some(c) if c.action == CandidateAction::Copy && c.source_path.is_some() => {
                copy(c, session)?;
                report.copied += 1;
            }
            Some(_) => report.skipped += 1,
            None => {
                report.skipped += 1;
                api.audit.log(
                    Level::Info,
                    &format!("migrate: no selection for {}, left as is", conflict.label),
                );
                continue;
            }
        }
        settled.extend(conflict.candidates.iter().filter_map(|c| c.origin.clone()));
    }

    let link_plan = api.build_link_plan()?;
    report.links = crate::api::apply::run(api, &link_plan, &ForceScope::Only(settled), session)?;
    api.audit.log(
        Level::Info,
        &format!(
            "migrate: {} copied, {} skipped",
            report.copied, report.skipped
        ),
    );
    Ok(report)
}

/// Copy one candidate over its canonical target, journaling the target first.
fn copy_candidate(c: &MigrationCandidate, session: &mut BackupSession) -> Result<(), ApiError> {
    let Some(src) = &c.source_path else {
        return Ok(());
    };
    let dst = &c.target_path;
    if !session.backup_path(dst)? {
        if let Some(parent) = dst.parent() {
            session.create_dir_all(parent)?;
        }
        session.record_created_path(dst, c.kind.into())?;
    }
    copy_entry(src, dst).map_err(io_at("copy", dst))
}
