use std::fs;
use std::path::Path;

use canonlink::types::Selections;
use canonlink::Client;

use crate::helpers::testroot::is_link;
use crate::helpers::{linker, TestRoot};

#[test]
fn empty_canonical_root_migrates_then_links_each_file() {
    let root = TestRoot::new();
    root.write(".claude/commands/a.md", "a");
    root.write(".claude/commands/b.md", "b");

    let (api, _) = linker(&root, &[Client::Claude]);
    let plan = api.scan_migration();
    assert_eq!(plan.auto.len(), 2);
    assert!(plan.conflicts.is_empty());

    let mut session = api.open_session().unwrap();
    let report = api
        .apply_migration(&plan, &Selections::new(), &mut session)
        .unwrap();
    api.finalize(&mut session).unwrap();

    assert_eq!(report.copied, 2);
    assert_eq!(report.links.backed_up, 2);
    for name in ["a.md", "b.md"] {
        let link = root.join(".claude/commands").join(name);
        assert!(is_link(&link));
        assert_eq!(
            fs::read_link(&link).unwrap(),
            Path::new("../../.agents/commands").join(name)
        );
        assert_eq!(
            fs::read_to_string(root.canonical("commands").join(name)).unwrap(),
            name.trim_end_matches(".md")
        );
    }
}

#[test]
fn selected_candidate_wins_and_every_origin_is_linked() {
    let root = TestRoot::new();
    let claude = root.write(".claude/commands/review.md", "claude review");
    let factory = root.write(".factory/commands/review.md", "factory review");

    let (api, _) = linker(&root, &[Client::Claude, Client::Factory]);
    let plan = api.scan_migration();
    let mut selections = Selections::new();
    selections.insert(root.canonical("commands/review.md"), 1);

    let mut session = api.open_session().unwrap();
    let report = api.apply_migration(&plan, &selections, &mut session).unwrap();
    assert_eq!(report.copied, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(
        fs::read_to_string(root.canonical("commands/review.md")).unwrap(),
        "factory review"
    );
    assert!(is_link(&claude));
    assert!(is_link(&factory));
}

#[test]
fn unselected_conflicts_are_skipped_and_left_in_place() {
    let root = TestRoot::new();
    let claude = root.write(".claude/commands/review.md", "claude review");
    root.write(".factory/commands/review.md", "factory review");

    let (api, _) = linker(&root, &[Client::Claude, Client::Factory]);
    let plan = api.scan_migration();
    let mut selections = Selections::new();
    // Out of range behaves like no selection.
    selections.insert(root.canonical("commands/review.md"), 7);

    let mut session = api.open_session().unwrap();
    let report = api.apply_migration(&plan, &selections, &mut session).unwrap();
    assert_eq!(report.copied, 0);
    assert_eq!(report.skipped, 1);
    assert!(!root.canonical("commands/review.md").exists());
    assert!(!is_link(&claude));
    assert_eq!(fs::read_to_string(&claude).unwrap(), "claude review");
}

#[test]
fn keeping_canonical_content_still_links_the_client() {
    let root = TestRoot::new();
    root.write(".agents/AGENTS.md", "canonical");
    let codex = root.write(".codex/AGENTS.md", "codex");

    let (api, _) = linker(&root, &[Client::Codex]);
    let plan = api.scan_migration();
    let mut selections = Selections::new();
    selections.insert(root.canonical("AGENTS.md"), 0);

    let mut session = api.open_session().unwrap();
    let report = api.apply_migration(&plan, &selections, &mut session).unwrap();
    assert_eq!(report.skipped, 1);
    assert!(is_link(&codex));
    assert_eq!(fs::read_to_string(&codex).unwrap(), "canonical");
    assert_eq!(report.links.backed_up, 1);
}

#[test]
fn migrate_twice_is_idempotent() {
    let root = TestRoot::new();
    root.write(".claude/commands/a.md", "a");
    root.write(".claude/CLAUDE.md", "claude");
    root.skill(".claude/skills/review", "review");
    root.write(".codex/prompts/p.md", "p");

    let clients = [Client::Claude, Client::Codex];
    let (api, _) = linker(&root, &clients);
    let plan = api.scan_migration();
    let mut session = api.open_session().unwrap();
    api.apply_migration(&plan, &Selections::new(), &mut session)
        .unwrap();
    api.finalize(&mut session).unwrap();

    let again = api.scan_migration();
    assert!(again.is_empty(), "{again:?}");
    let link_plan = api.build_link_plan().unwrap();
    assert!(link_plan.changes.is_empty(), "{:?}", link_plan.changes);
    assert!(link_plan.conflicts.is_empty(), "{:?}", link_plan.conflicts);
}
