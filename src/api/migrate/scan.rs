use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use log::Level;
use serde_json::json;

use crate::clients::{find_skill_dirs, Category, Client};
use crate::config::Options;
use crate::constants::INSTRUCTIONS_FILE;
use crate::fs::{kind_following, kind_of, label_for, PathKind};
use crate::logging::{AuditSink, FactsEmitter, Stage, StageLogger};
use crate::types::{
    CandidateAction, EntryKind, MigrationCandidate, MigrationConflict, MigrationPlan,
};

/// Something a client holds that belongs in the canonical tree.
#[derive(Debug)]
struct Found {
    client: Client,
    source: PathBuf,
    target: PathBuf,
    kind: EntryKind,
}

pub(in crate::api) fn run<E: FactsEmitter, A: AuditSink>(
    api: &crate::api::Linker<E, A>,
) -> MigrationPlan {
    let options = &api.options;
    let (plan, failed) = build(options);

    let canonical = options.canonical_root();
    let ctx = api.ctx("migrate");
    let slog = StageLogger::new(&ctx);
    for client in &failed {
        slog.stage(Stage::MigrateScan)
            .path(canonical.display().to_string())
            .field("client", json!(client.as_str()))
            .field("error", json!("client scan panicked"))
            .emit_warn();
        api.audit.log(
            Level::Warn,
            &format!("migration scan of {client} failed; its content is missing from this plan"),
        );
    }
    slog.stage(Stage::MigrateScan)
        .path(canonical.display().to_string())
        .field("auto", json!(plan.auto.len()))
        .field("conflicts", json!(plan.conflicts.len()))
        .field(
            "clients",
            json!(options.clients.iter().map(|c| c.as_str()).collect::<Vec<_>>()),
        )
        .field(
            "failed_clients",
            json!(failed.iter().map(|c| c.as_str()).collect::<Vec<_>>()),
        )
        .emit_success();
    plan
}

/// Flatten per-client scan results. A scan that panicked is returned in the
/// second list rather than silently contributing nothing.
fn gather(results: Vec<(Client, thread::Result<Vec<Found>>)>) -> (Vec<Found>, Vec<Client>) {
    let mut found = Vec::new();
    let mut failed = Vec::new();
    for (client, result) in results {
        match result {
            Ok(f) => found.extend(f),
            Err(_) => failed.push(client),
        }
    }
    (found, failed)
}

/// Scan every enabled client and group what was found by canonical target.
/// Also returns the clients whose scan failed.
pub(crate) fn build(options: &Options) -> (MigrationPlan, Vec<Client>) {
    let (mut found, failed) = thread::scope(|s| {
        let handles: Vec<_> = options
            .clients
            .iter()
            .map(|&client| (client, s.spawn(move || scan_client(options, client))))
            .collect();
        gather(
            handles
                .into_iter()
                .map(|(client, h)| (client, h.join()))
                .collect(),
        )
    });
    // Join order already follows the client list; sort anyway so grouping
    // never depends on how the scans were scheduled.
    found.sort_by_key(|f| f.client);

    // Shared project files (one AGENTS.md read by several clients) are offered once.
    let mut seen = Vec::new();
    found.retain(|f| {
        if seen.contains(&f.source) {
            false
        } else {
            seen.push(f.source.clone());
            true
        }
    });

    let canonical = options.canonical_root();
    let base = &options.roots.base;
    let mut groups: BTreeMap<PathBuf, Vec<MigrationCandidate>> = BTreeMap::new();
    for f in found {
        groups.entry(f.target.clone()).or_default().push(MigrationCandidate {
            label: format!("{}: {}", f.client, label_for(&f.source, base)),
            target_path: f.target,
            kind: f.kind,
            action: CandidateAction::Copy,
            origin: Some(f.source.clone()),
            source_path: Some(f.source),
        });
    }

    let mut plan = MigrationPlan {
        canonical_root: canonical.to_path_buf(),
        ..MigrationPlan::default()
    };
    for (target, mut candidates) in groups {
        let existing = kind_following(&target);
        if existing.exists() {
            let kind = if existing == PathKind::Dir {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            candidates.insert(
                0,
                MigrationCandidate {
                    label: format!("keep existing {}", label_for(&target, canonical)),
                    target_path: target.clone(),
                    kind,
                    action: CandidateAction::Keep,
                    source_path: None,
                    origin: None,
                },
            );
        } else if candidates.len() == 1 {
            plan.auto.append(&mut candidates);
            continue;
        }
        plan.conflicts.push(MigrationConflict {
            label: label_for(&target, canonical),
            target_path: target,
            candidates,
        });
    }
    (plan, failed)
}

/// Real (non-symlink) children of a client category directory that is
/// itself a real directory.
fn scan_client(options: &Options, client: Client) -> Vec<Found> {
    let roots = &options.roots;
    let canonical = options.canonical_root();
    let mut out = Vec::new();

    for category in Category::ALL {
        let Some(dir) = roots.category_path(client, category) else {
            continue;
        };
        if kind_of(&dir) != PathKind::Dir {
            continue;
        }
        let canonical_dir = canonical.join(category.as_str());
        match category.entry_kind() {
            EntryKind::File => {
                for path in file_children(&dir) {
                    if let Some(name) = path.file_name() {
                        out.push(Found {
                            client,
                            target: canonical_dir.join(name),
                            source: path,
                            kind: EntryKind::File,
                        });
                    }
                }
            }
            EntryKind::Dir => {
                for (path, desc) in find_skill_dirs(&dir) {
                    out.push(Found {
                        client,
                        source: path,
                        target: canonical_dir.join(&desc.name),
                        kind: EntryKind::Dir,
                    });
                }
            }
        }
    }

    if let Some(path) = roots.instructions_path(client) {
        if kind_of(&path) == PathKind::File {
            out.push(Found {
                client,
                source: path,
                target: canonical.join(INSTRUCTIONS_FILE),
                kind: EntryKind::File,
            });
        }
    }
    out
}

fn file_children(dir: &Path) -> Vec<PathBuf> {
    let Ok(rd) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = rd
        .flatten()
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .map(|e| e.path())
        .filter(|p| kind_of(p) == PathKind::File)
        .collect();
    out.sort();
    out
}
