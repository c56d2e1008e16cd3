use std::fs;

use canonlink::types::{Selections, UndoReport};
use canonlink::Client;

use crate::helpers::testroot::is_link;
use crate::helpers::{linker, TestRoot};

#[test]
fn undo_after_forced_link_restores_tree_exactly() {
    let root = TestRoot::new();
    root.write(".agents/AGENTS.md", "shared");
    root.write(".claude/CLAUDE.md", "custom claude");
    root.write(".claude/commands/keep.md", "keep");
    root.write(".codex/AGENTS.md", "custom codex");
    root.link(".gemini/GEMINI.md", "../elsewhere.md");
    let before = root.snapshot();

    let (api, _) = linker(&root, &Client::ALL);
    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    let applied = api.apply_link_plan(&plan, true, &mut session).unwrap();
    let dir = api.finalize(&mut session).unwrap().unwrap();
    assert_ne!(root.snapshot(), before);

    let report = api.undo_last_change().unwrap();
    assert_eq!(report.restored_backups, applied.backed_up);
    assert!(report.removed_symlinks > 0);
    assert_eq!(report.backup_dir.as_deref(), Some(dir.as_path()));
    assert!(report
        .undone_dir
        .as_ref()
        .unwrap()
        .starts_with(root.canonical(".backups/undone")));
    assert_eq!(root.snapshot(), before);
}

#[test]
fn undo_after_migration_restores_client_content() {
    let root = TestRoot::new();
    root.write(".claude/commands/a.md", "a");
    root.skill(".claude/skills/review", "review");
    root.write(".gemini/GEMINI.md", "gemini");
    let before = root.snapshot();

    let (api, _) = linker(&root, &[Client::Claude, Client::Gemini]);
    let plan = api.scan_migration();
    let mut session = api.open_session().unwrap();
    api.apply_migration(&plan, &Selections::new(), &mut session)
        .unwrap();
    api.finalize(&mut session).unwrap();
    assert!(is_link(&root.join(".claude/commands/a.md")));

    let report = api.undo_last_change().unwrap();
    assert!(report.restored_backups >= 3);
    assert_eq!(root.snapshot(), before);
    assert!(!root.canonical("commands").exists());
}

#[test]
fn undo_without_sessions_reports_zero() {
    let root = TestRoot::new();
    let (api, _) = linker(&root, &[Client::Codex]);
    assert_eq!(api.undo_last_change().unwrap(), UndoReport::default());
}

#[test]
fn repeated_undo_is_a_no_op() {
    let root = TestRoot::new();
    root.write(".agents/AGENTS.md", "shared");
    let codex = root.write(".codex/AGENTS.md", "custom");

    let (first_api, _) = linker(&root, &[Client::Codex]);
    let plan = first_api.build_link_plan().unwrap();
    let mut session = first_api.open_session().unwrap();
    first_api.apply_link_plan(&plan, true, &mut session).unwrap();
    first_api.finalize(&mut session).unwrap().unwrap();

    let (api, _) = linker(&root, &[Client::Codex, Client::Gemini]);
    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    api.apply_link_plan(&plan, false, &mut session).unwrap();
    api.finalize(&mut session).unwrap().unwrap();

    let first = api.undo_last_change().unwrap();
    assert_eq!(first.restored_backups, 0);
    assert_eq!(first.removed_symlinks, 1);
    assert!(!root.join(".gemini/GEMINI.md").exists());

    assert_eq!(api.undo_last_change().unwrap(), UndoReport::default());
    assert!(is_link(&codex), "the earlier forced link stays");
    assert_eq!(fs::read_to_string(&codex).unwrap(), "shared");
}

#[test]
fn no_change_run_does_not_shadow_previous_session() {
    let root = TestRoot::new();
    let custom = root.write(".codex/AGENTS.md", "custom");
    let (api, _) = linker(&root, &[Client::Codex]);

    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    api.apply_link_plan(&plan, true, &mut session).unwrap();
    assert!(api.finalize(&mut session).unwrap().is_some());

    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    api.apply_link_plan(&plan, false, &mut session).unwrap();
    assert!(api.finalize(&mut session).unwrap().is_none());

    let report = api.undo_last_change().unwrap();
    assert_eq!(report.restored_backups, 1);
    assert_eq!(fs::read_to_string(&custom).unwrap(), "custom");
}

#[test]
fn tampered_payload_is_restored_with_a_warning() {
    let root = TestRoot::new();
    let custom = root.write(".codex/AGENTS.md", "custom");
    let (api, facts) = linker(&root, &[Client::Codex]);
    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    api.apply_link_plan(&plan, true, &mut session).unwrap();
    let payload = session.backed_up()[0].backup.clone();
    api.finalize(&mut session).unwrap();

    fs::write(&payload, "tampered").unwrap();
    let report = api.undo_last_change().unwrap();
    assert_eq!(report.restored_backups, 1);
    assert_eq!(fs::read_to_string(&custom).unwrap(), "tampered");
    assert_eq!(facts.count("undo", "warn"), 1);
}
