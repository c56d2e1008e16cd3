//! Link plan builder: one task per (mapping, target), computed from what is
//! on disk right now. Nothing here mutates the filesystem.
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::fs::{
    kind_following, kind_of, link_text_for, resolve_symlink_target, same_location, PathKind,
};
use crate::logging::audit::AuditCtx;
use crate::logging::{AuditSink, FactsEmitter, Stage, StageLogger, TS_ZERO};
use crate::types::ids::{plan_id, task_id};
use crate::types::{EntryKind, LinkPlan, LinkTask, Mapping, Projection};

/// Build the plan for `mappings` and emit one `plan` fact per task.
pub(super) fn build<E: FactsEmitter, A: AuditSink>(
    api: &super::Linker<E, A>,
    mappings: &[Mapping],
) -> LinkPlan {
    let plan = LinkPlan::from_tasks(plan_tasks(mappings));

    let pid = plan_id(&plan);
    let ctx = AuditCtx::new(
        &api.facts as &dyn FactsEmitter,
        pid.to_string(),
        TS_ZERO.to_string(),
    );
    let slog = StageLogger::new(&ctx);
    for (idx, task) in plan.tasks.iter().enumerate() {
        let mut ev = slog
            .stage(Stage::Plan)
            .action(task_id(&pid, task, idx).to_string())
            .path(task.path().display().to_string())
            .field("task", json!(task.label()));
        if let LinkTask::Conflict { reason, kind, .. } = task {
            ev = ev
                .field("reason", json!(reason))
                .field("force_eligible", json!(kind.is_some()));
        }
        ev.emit_success();
    }
    plan
}

/// Tasks for every mapping, in mapping order; each mapping's ensure-source
/// task (if any) comes before its targets.
pub(crate) fn plan_tasks(mappings: &[Mapping]) -> Vec<LinkTask> {
    let mut tasks = Vec::new();
    for m in mappings {
        let source = m.source_path();
        if let Some(t) = source_task(&source, m.kind) {
            tasks.push(t);
        }
        match m.projection {
            Projection::Whole => {
                for target in &m.targets {
                    tasks.push(classify(&source, target, m.kind, &m.relinkable));
                }
            }
            Projection::Entries { entry } => entry_tasks(m, &source, entry, &mut tasks),
        }
    }
    tasks
}

fn source_task(source: &Path, kind: EntryKind) -> Option<LinkTask> {
    let found = match kind_following(source) {
        PathKind::Missing if kind_of(source) == PathKind::Symlink => "dangling symlink",
        PathKind::Missing => {
            return Some(LinkTask::EnsureSource {
                path: source.to_path_buf(),
                kind,
            })
        }
        k if k.matches(kind) => return None,
        k => k.as_str(),
    };
    Some(LinkTask::Conflict {
        source: source.to_path_buf(),
        target: source.to_path_buf(),
        reason: format!("Expected {kind} but found {found}"),
        kind: None,
    })
}

/// Classify one target against `source`.
pub(crate) fn classify(
    source: &Path,
    target: &Path,
    kind: EntryKind,
    relinkable: &[PathBuf],
) -> LinkTask {
    let link = |replace_symlink| LinkTask::Link {
        source: source.to_path_buf(),
        target: target.to_path_buf(),
        kind,
        replace_symlink,
        adopt: false,
    };
    let conflict = |reason: String| LinkTask::Conflict {
        source: source.to_path_buf(),
        target: target.to_path_buf(),
        reason,
        kind: Some(kind),
    };

    match kind_of(target) {
        PathKind::Missing => link(false),
        PathKind::Symlink => {
            let Some(resolved) = resolve_symlink_target(target) else {
                return conflict("Symlink could not be read".to_string());
            };
            if same_location(&resolved, source) {
                let current = fs::read_link(target).ok();
                if current.as_deref() == Some(link_text_for(target, source).as_path()) {
                    LinkTask::Noop {
                        source: source.to_path_buf(),
                        target: target.to_path_buf(),
                    }
                } else {
                    link(true)
                }
            } else if relinkable.iter().any(|r| same_location(&resolved, r)) {
                link(true)
            } else {
                conflict(format!("Symlink points elsewhere: {}", resolved.display()))
            }
        }
        other => conflict(format!("Target exists and is not a symlink ({other})")),
    }
}

fn is_hidden(name: &OsString) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Non-hidden children of `dir` for which `keep` holds, by name.
fn child_names(dir: &Path, keep: impl Fn(&Path) -> bool) -> BTreeSet<OsString> {
    let Ok(rd) = fs::read_dir(dir) else {
        return BTreeSet::new();
    };
    rd.flatten()
        .map(|e| e.file_name())
        .filter(|n| !is_hidden(n))
        .filter(|n| keep(&dir.join(n)))
        .collect()
}

fn entry_tasks(m: &Mapping, source_dir: &Path, entry: EntryKind, tasks: &mut Vec<LinkTask>) {
    let mut names = child_names(source_dir, |p| kind_following(p).matches(entry));

    let mut dirs = Vec::new();
    for target_dir in &m.targets {
        let reason = match kind_of(target_dir) {
            PathKind::Missing | PathKind::Dir => {
                dirs.push(target_dir);
                continue;
            }
            PathKind::Symlink => format!(
                "Directory is a symlink: {}",
                resolve_symlink_target(target_dir)
                    .unwrap_or_default()
                    .display()
            ),
            other => format!("Target exists and is not a directory ({other})"),
        };
        tasks.push(LinkTask::Conflict {
            source: source_dir.to_path_buf(),
            target: target_dir.clone(),
            reason,
            kind: None,
        });
    }

    for dir in &dirs {
        names.extend(child_names(dir, |p| {
            matches!(
                (kind_of(p), entry),
                (PathKind::Symlink, _)
                    | (PathKind::File, EntryKind::File)
                    | (PathKind::Dir, EntryKind::Dir)
            )
        }));
    }

    // Adoptions come first so every later link to the same name finds its source.
    let mut adopted = BTreeSet::new();
    for name in &names {
        let source = source_dir.join(name);
        if let Some(holder) = sole_holder(&dirs, name, &source, entry) {
            tasks.push(LinkTask::Link {
                source,
                target: holder.join(name),
                kind: entry,
                replace_symlink: false,
                adopt: true,
            });
            adopted.insert((holder.clone(), name.clone()));
        }
    }

    for dir in dirs {
        for name in &names {
            if adopted.contains(&(dir.clone(), name.clone())) {
                continue;
            }
            let source = source_dir.join(name);
            let target = dir.join(name);
            let is_adopted = adopted.iter().any(|(_, n)| n == name);
            let task = match kind_following(&source) {
                k if k.matches(entry) => classify(&source, &target, entry, &[]),
                PathKind::Missing if is_adopted => classify(&source, &target, entry, &[]),
                PathKind::Missing => unprojected(&source, &target, entry),
                k => LinkTask::Conflict {
                    reason: format!("Expected {entry} but found {k}"),
                    source,
                    target,
                    kind: None,
                },
            };
            tasks.push(task);
        }
    }
}

/// The one client directory holding a plain file `name` that canonical
/// lacks. Its content can seed the canonical entry without a choice being
/// made; several holders (or directory entries such as skills, whose
/// canonical name comes from a descriptor) are left to migration.
fn sole_holder<'a>(
    dirs: &[&'a PathBuf],
    name: &OsString,
    source: &Path,
    entry: EntryKind,
) -> Option<&'a PathBuf> {
    if entry != EntryKind::File || kind_of(source).exists() {
        return None;
    }
    let mut holders = dirs
        .iter()
        .copied()
        .filter(|d| kind_of(&d.join(name)) == PathKind::File);
    let first = holders.next()?;
    holders.next().is_none().then_some(first)
}

/// A client entry with no canonical counterpart yet. Only migration may
/// replace real content here, so such conflicts carry no kind.
fn unprojected(source: &Path, target: &Path, entry: EntryKind) -> LinkTask {
    match kind_of(target) {
        PathKind::Missing => LinkTask::Noop {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
        },
        PathKind::Symlink => classify(source, target, entry, &[]),
        other => LinkTask::Conflict {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            reason: format!("Target exists and is not a symlink ({other})"),
            kind: None,
        },
    }
}
