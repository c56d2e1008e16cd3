use log::Level;
use serde_json::json;

use super::errors::{id_str, ApiError};
use crate::journal;
use crate::logging::{AuditSink, FactsEmitter, Stage, StageLogger};
use crate::types::UndoReport;

pub(super) fn run<E: FactsEmitter, A: AuditSink>(
    api: &super::Linker<E, A>,
) -> Result<UndoReport, ApiError> {
    let canonical = api.options.canonical_root();
    let ctx = api.ctx("undo");
    let slog = StageLogger::new(&ctx);

    let outcome = match journal::undo_last_change(canonical) {
        Ok(o) => o,
        Err(e) => {
            slog.stage(Stage::Undo)
                .path(canonical.display().to_string())
                .field("error", json!(e.to_string()))
                .field("error_id", json!(id_str(e.id())))
                .emit_failure();
            return Err(e);
        }
    };
    for w in &outcome.warnings {
        slog.stage(Stage::Undo)
            .path(canonical.display().to_string())
            .field("warning", json!(w))
            .emit_warn();
        api.audit.log(Level::Warn, w);
    }

    let r = &outcome.report;
    slog.stage(Stage::Undo)
        .path(
            r.backup_dir
                .as_deref()
                .unwrap_or(canonical)
                .display()
                .to_string(),
        )
        .field("restored_backups", json!(r.restored_backups))
        .field("removed_created", json!(r.removed_created))
        .field("removed_symlinks", json!(r.removed_symlinks))
        .emit_success();
    match &r.backup_dir {
        Some(dir) => api.audit.log(
            Level::Info,
            &format!(
                "undo {}: {} restored, {} removed, {} links removed",
                dir.display(),
                r.restored_backups,
                r.removed_created,
                r.removed_symlinks
            ),
        ),
        None => api.audit.log(Level::Info, "undo: nothing to undo"),
    }
    Ok(outcome.report)
}
