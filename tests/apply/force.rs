use std::fs;

use canonlink::types::LinkTask;
use canonlink::Client;

use crate::helpers::testroot::is_link;
use crate::helpers::{linker, TestRoot};

#[test]
fn force_links_every_eligible_conflict_and_backs_each_up_once() {
    let root = TestRoot::new();
    root.write(".agents/AGENTS.md", "shared");
    root.write(".agents/commands/a.md", "a");
    root.write("elsewhere.md", "x");
    let file = root.write(".claude/CLAUDE.md", "custom");
    let foreign = root.link(".codex/AGENTS.md", "../elsewhere.md");
    let dir = root.join(".claude/commands/a.md");
    fs::create_dir_all(dir.join("nested")).unwrap();

    let (api, _) = linker(&root, &[Client::Claude, Client::Codex]);
    let plan = api.build_link_plan().unwrap();
    let eligible = plan
        .conflicts
        .iter()
        .filter(|t| matches!(t, LinkTask::Conflict { kind: Some(_), .. }))
        .count();
    assert_eq!(eligible, 3);

    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&plan, true, &mut session).unwrap();
    assert_eq!(report.conflicts, 3);
    assert_eq!(report.backed_up, 3);
    assert_eq!(session.backed_up().len(), 3);
    for target in [&file, &foreign, &dir] {
        assert!(is_link(target), "{} not linked", target.display());
    }
    assert_eq!(fs::read_to_string(&file).unwrap(), "shared");
}

#[test]
fn source_kind_mismatch_is_never_forced() {
    let root = TestRoot::new();
    root.write(".agents/commands", "a file where a directory belongs");
    let (api, _) = linker(&root, &[Client::Cursor]);
    let plan = api.build_link_plan().unwrap();
    match &plan.tasks[0] {
        LinkTask::Conflict { reason, kind, .. } => {
            assert_eq!(reason, "Expected dir but found file");
            assert!(kind.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }

    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&plan, true, &mut session).unwrap();
    assert_eq!(report.backed_up, 0);
    assert!(root.canonical("commands").is_file());
}

#[test]
fn contested_client_content_is_not_forced() {
    let root = TestRoot::new();
    let claude = root.write(".claude/commands/review.md", "claude review");
    let cursor = root.write(".cursor/commands/review.md", "cursor review");
    let (api, _) = linker(&root, &[Client::Claude, Client::Cursor]);
    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&plan, true, &mut session).unwrap();
    assert_eq!(report.backed_up, 0);
    for (path, body) in [(&claude, "claude review"), (&cursor, "cursor review")] {
        assert!(!is_link(path));
        assert_eq!(fs::read_to_string(path).unwrap(), body);
    }
    assert!(!root.canonical("commands/review.md").exists());
}
