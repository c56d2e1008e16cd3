use std::fs;

use canonlink::types::Selections;
use canonlink::{ApiError, Client};

use crate::helpers::testroot::is_link;
use crate::helpers::{linker, TestRoot};

/// Claude's instruction file gets forced first; Codex's client root is then
/// replaced by a plain file, so linking `.codex/AGENTS.md` fails before
/// Gemini's task runs.
fn broken_after_planning() -> (TestRoot, canonlink::types::LinkPlan) {
    let root = TestRoot::new();
    root.write(".agents/AGENTS.md", "shared");
    root.write(".claude/CLAUDE.md", "my precious instructions");
    let (api, _) = linker(&root, &[Client::Claude, Client::Codex, Client::Gemini]);
    let plan = api.build_link_plan().unwrap();
    root.write(".codex", "not a directory");
    (root, plan)
}

#[test]
fn failed_apply_stops_with_path_context_and_undo_restores_journaled_work() {
    let (root, plan) = broken_after_planning();
    let before = root.snapshot();
    let (api, facts) = linker(&root, &[Client::Claude, Client::Codex, Client::Gemini]);

    let mut session = api.open_session().unwrap();
    let err = api.apply_link_plan(&plan, true, &mut session).unwrap_err();
    match &err {
        ApiError::Filesystem { op, path, .. } => {
            assert_eq!(*op, "create symlink");
            assert_eq!(path, &root.join(".codex/AGENTS.md"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(canonlink::exit_code_for(err.id()), 40);
    assert_eq!(facts.count("link.apply", "failure"), 1);
    assert!(is_link(&root.join(".claude/CLAUDE.md")));
    assert!(!root.join(".gemini/GEMINI.md").exists(), "later tasks must not run");

    assert!(api.finalize(&mut session).unwrap().is_some());
    let report = api.undo_last_change().unwrap();
    assert_eq!(report.restored_backups, 1);
    assert_eq!(root.snapshot(), before);
    assert_eq!(
        fs::read_to_string(root.join(".claude/CLAUDE.md")).unwrap(),
        "my precious instructions"
    );
}

#[test]
fn session_abandoned_after_a_failure_is_still_undoable() {
    let (root, plan) = broken_after_planning();
    let before = root.snapshot();
    let (api, _) = linker(&root, &[Client::Claude, Client::Codex, Client::Gemini]);

    let mut session = api.open_session().unwrap();
    api.apply_link_plan(&plan, true, &mut session).unwrap_err();
    drop(session);

    let report = api.undo_last_change().unwrap();
    assert_eq!(report.restored_backups, 1);
    assert_eq!(root.snapshot(), before);
    assert_eq!(api.undo_last_change().unwrap(), Default::default());
}

#[test]
fn failed_migration_is_undone_including_copied_content() {
    let root = TestRoot::new();
    root.write(".claude/commands/a.md", "a");
    root.write(".claude/CLAUDE.md", "claude");
    let clients = [Client::Claude, Client::Cursor];
    let (api, facts) = linker(&root, &clients);
    let plan = api.scan_migration();
    root.write(".cursor", "not a directory");
    let before = root.snapshot();

    let mut session = api.open_session().unwrap();
    let err = api
        .apply_migration(&plan, &Selections::new(), &mut session)
        .unwrap_err();
    assert!(matches!(err, ApiError::Filesystem { ref path, .. } if path.starts_with(root.join(".cursor"))));
    assert_eq!(facts.count("link.apply", "failure"), 1);
    assert!(root.canonical("commands/a.md").exists());
    api.finalize(&mut session).unwrap();

    api.undo_last_change().unwrap();
    assert_eq!(root.snapshot(), before);
    assert!(!root.canonical("commands/a.md").exists());
}
