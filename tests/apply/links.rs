use std::fs;

use canonlink::constants::DEFAULT_INSTRUCTIONS_TEMPLATE;
use canonlink::types::LinkTask;
use canonlink::{ApiError, Client};

use crate::helpers::testroot::is_link;
use crate::helpers::{linker, TestRoot};

#[test]
fn ensure_source_seeds_template_and_links_are_relative() {
    let root = TestRoot::new();
    let (api, facts) = linker(&root, &[Client::Codex, Client::Gemini]);
    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&plan, false, &mut session).unwrap();
    api.finalize(&mut session).unwrap();

    assert_eq!(report.conflicts, 0);
    assert_eq!(
        fs::read_to_string(root.canonical("AGENTS.md")).unwrap(),
        DEFAULT_INSTRUCTIONS_TEMPLATE
    );
    assert!(root.canonical("commands").is_dir());
    assert!(root.canonical("skills").is_dir());
    assert_eq!(
        fs::read_link(root.join(".codex/AGENTS.md")).unwrap(),
        std::path::Path::new("../.agents/AGENTS.md")
    );
    assert_eq!(
        fs::read_to_string(root.join(".gemini/GEMINI.md")).unwrap(),
        DEFAULT_INSTRUCTIONS_TEMPLATE
    );
    assert_eq!(report.backup_dir, session.dir());
    assert_eq!(facts.count("link.apply", "success"), plan.tasks.len());
}

#[test]
fn per_file_links_point_into_canonical_category() {
    let root = TestRoot::new();
    root.write(".agents/commands/a.md", "a");
    root.write(".agents/commands/b.md", "b");
    let (api, _) = linker(&root, &[Client::Claude]);
    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    api.apply_link_plan(&plan, false, &mut session).unwrap();

    for name in ["a.md", "b.md"] {
        let link = root.join(".claude/commands").join(name);
        assert!(is_link(&link));
        assert_eq!(
            fs::read_link(&link).unwrap(),
            std::path::Path::new("../../.agents/commands").join(name)
        );
    }
    assert!(!is_link(&root.join(".claude/commands")));
}

#[test]
fn non_forced_apply_leaves_conflicts_untouched() {
    let root = TestRoot::new();
    root.write(".agents/AGENTS.md", "shared");
    let custom = root.write(".claude/CLAUDE.md", "custom");
    let (api, _) = linker(&root, &[Client::Claude]);
    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&plan, false, &mut session).unwrap();

    assert_eq!(report.conflicts, 1);
    assert_eq!(report.backed_up, 0);
    assert!(!is_link(&custom));
    assert_eq!(fs::read_to_string(&custom).unwrap(), "custom");
}

#[test]
fn second_run_is_settled() {
    let root = TestRoot::new();
    root.write(".agents/commands/a.md", "a");
    root.skill(".agents/skills/review", "review");
    let clients = Client::ALL;
    let (api, _) = linker(&root, &clients);

    let first = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    api.apply_link_plan(&first, false, &mut session).unwrap();
    api.finalize(&mut session).unwrap();

    let second = api.build_link_plan().unwrap();
    assert!(second.is_settled(), "{:?}", second.changes);
    assert!(second.tasks.iter().all(|t| matches!(t, LinkTask::Noop { .. })));
    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&second, false, &mut session).unwrap();
    assert_eq!(report.applied, 0);
    assert_eq!(api.finalize(&mut session).unwrap(), None);
}

#[test]
fn stale_replace_is_skipped_when_target_became_real() {
    let root = TestRoot::new();
    let source = root.write(".agents/AGENTS.md", "shared");
    let target = root.link(".codex/AGENTS.md", &source);
    let (api, _) = linker(&root, &[Client::Codex]);
    let plan = api.build_link_plan().unwrap();
    assert!(plan
        .changes
        .iter()
        .any(|t| matches!(t, LinkTask::Link { replace_symlink: true, .. })));

    fs::remove_file(&target).unwrap();
    fs::write(&target, "written after planning").unwrap();

    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&plan, false, &mut session).unwrap();
    assert_eq!(report.backed_up, 0);
    assert_eq!(fs::read_to_string(&target).unwrap(), "written after planning");
}

#[test]
fn finalized_session_is_rejected() {
    let root = TestRoot::new();
    let (api, _) = linker(&root, &[Client::Codex]);
    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    api.apply_link_plan(&plan, false, &mut session).unwrap();
    api.finalize(&mut session).unwrap();

    let err = api.apply_link_plan(&plan, false, &mut session).unwrap_err();
    assert!(matches!(err, ApiError::SessionClosed(_)));
    assert_eq!(canonlink::exit_code_for(err.id()), 10);
}

#[test]
fn sole_client_file_seeds_canonical_and_every_client_links_to_it() {
    let root = TestRoot::new();
    let local = root.write(".cursor/commands/local.md", "only here");
    let (api, _) = linker(&root, &[Client::Claude, Client::Cursor]);
    let plan = api.build_link_plan().unwrap();
    assert!(matches!(
        &plan.changes[1],
        LinkTask::Link { adopt: true, target, .. } if *target == local
    ));

    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&plan, false, &mut session).unwrap();
    assert_eq!(report.backed_up, 1);
    assert_eq!(
        fs::read_to_string(root.canonical("commands/local.md")).unwrap(),
        "only here"
    );
    for client in [".cursor", ".claude"] {
        let link = root.join(client).join("commands/local.md");
        assert!(is_link(&link), "{} not linked", link.display());
        assert_eq!(fs::read_to_string(&link).unwrap(), "only here");
    }
    api.finalize(&mut session).unwrap();
    assert!(api.build_link_plan().unwrap().is_settled());
}

#[test]
fn adoption_is_skipped_when_canonical_appeared_after_planning() {
    let root = TestRoot::new();
    let local = root.write(".cursor/commands/local.md", "client");
    let (api, _) = linker(&root, &[Client::Cursor]);
    let plan = api.build_link_plan().unwrap();
    root.write(".agents/commands/local.md", "canonical");

    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&plan, false, &mut session).unwrap();
    assert_eq!(report.backed_up, 0);
    assert!(!is_link(&local));
    assert_eq!(
        fs::read_to_string(root.canonical("commands/local.md")).unwrap(),
        "canonical"
    );
}

#[test]
fn client_root_behind_a_symlink_is_linked_through_it() {
    let root = TestRoot::new();
    root.write(".agents/AGENTS.md", "shared");
    fs::create_dir_all(root.join("dotfiles/claude")).unwrap();
    let claude_root = root.link(".claude", "dotfiles/claude");

    let (api, _) = linker(&root, &[Client::Claude]);
    let plan = api.build_link_plan().unwrap();
    let mut session = api.open_session().unwrap();
    let report = api.apply_link_plan(&plan, false, &mut session).unwrap();
    api.finalize(&mut session).unwrap();
    assert_eq!(report.conflicts, 0);

    let target = root.join(".claude/CLAUDE.md");
    assert!(is_link(&target));
    assert!(is_link(&claude_root), "client root stays a symlink");
    assert_eq!(fs::read_to_string(&target).unwrap(), "shared");
    assert_eq!(
        fs::read_link(root.join("dotfiles/claude/CLAUDE.md")).unwrap(),
        std::path::Path::new("../../.agents/AGENTS.md")
    );

    let again = api.build_link_plan().unwrap();
    assert!(matches!(
        again.tasks.iter().find(|t| t.path() == target),
        Some(LinkTask::Noop { .. })
    ));

    api.undo_last_change().unwrap();
    assert!(!is_link(&root.join("dotfiles/claude/CLAUDE.md")));
    assert!(root.join("dotfiles/claude").is_dir());
}
