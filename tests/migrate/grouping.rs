use canonlink::types::CandidateAction;
use canonlink::Client;

use crate::helpers::{linker, TestRoot};

#[test]
fn same_target_from_two_clients_is_one_conflict() {
    let root = TestRoot::new();
    root.write(".claude/commands/review.md", "claude review");
    root.write(".factory/commands/review.md", "factory review");
    root.write(".cursor/commands/solo.md", "solo");

    let (api, facts) = linker(&root, &[Client::Claude, Client::Factory, Client::Cursor]);
    let plan = api.scan_migration();
    assert_eq!(plan.conflicts.len(), 1);
    let conflict = &plan.conflicts[0];
    assert_eq!(conflict.label, "commands/review.md");
    assert_eq!(conflict.target_path, root.canonical("commands/review.md"));
    assert_eq!(conflict.candidates.len(), 2);
    assert!(conflict.candidates[0].label.starts_with("claude: "));
    assert!(conflict.candidates[1].label.starts_with("factory: "));

    assert_eq!(plan.auto.len(), 1);
    assert_eq!(plan.auto[0].target_path, root.canonical("commands/solo.md"));
    assert_eq!(facts.count("migrate.scan", "success"), 1);
}

#[test]
fn instruction_files_of_different_clients_compete_for_agents_md() {
    let root = TestRoot::new();
    root.write(".claude/CLAUDE.md", "claude");
    root.write(".gemini/GEMINI.md", "gemini");

    let (api, _) = linker(&root, &[Client::Claude, Client::Gemini]);
    let plan = api.scan_migration();
    assert!(plan.auto.is_empty());
    assert_eq!(plan.conflicts.len(), 1);
    assert_eq!(plan.conflicts[0].label, "AGENTS.md");
}

#[test]
fn existing_canonical_entry_is_kept_first() {
    let root = TestRoot::new();
    root.write(".agents/commands/a.md", "canonical");
    root.write(".cursor/commands/a.md", "cursor");

    let (api, _) = linker(&root, &[Client::Cursor]);
    let plan = api.scan_migration();
    assert!(plan.auto.is_empty());
    let c = &plan.conflicts[0];
    assert_eq!(c.candidates[0].action, CandidateAction::Keep);
    assert!(c.candidates[0].source_path.is_none());
    assert_eq!(c.candidates[1].action, CandidateAction::Copy);
}

#[test]
fn invalid_skill_descriptors_are_skipped() {
    let root = TestRoot::new();
    root.skill(".codex/skills/good", "good");
    root.write(".codex/skills/bad/SKILL.md", "---\ndescription: no name\n---\n");

    let (api, _) = linker(&root, &[Client::Codex]);
    let plan = api.scan_migration();
    assert_eq!(plan.auto.len(), 1);
    assert_eq!(plan.auto[0].target_path, root.canonical("skills/good"));
}
