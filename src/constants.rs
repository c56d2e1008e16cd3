//! Shared crate-wide constants for canonlink.
//!
//! Centralizes directory names, file names and default labels used across
//! modules.

/// Directory name of the canonical tree under a home or project root.
pub const CANONICAL_DIR: &str = ".agents";

/// Journal sessions live under `<canonical>/BACKUPS_DIR/<timestamp>/`.
pub const BACKUPS_DIR: &str = ".backups";

/// Consumed sessions are moved to `<canonical>/BACKUPS_DIR/UNDONE_DIR/`.
pub const UNDONE_DIR: &str = "undone";

/// Session index filename inside a session directory.
pub const SESSION_INDEX: &str = "session.json";

/// Subdirectory of a session holding moved-away payloads.
pub const PAYLOAD_DIR: &str = "payload";

pub const SESSION_SCHEMA: &str = "journal.v1";

/// Optional per-tree configuration file.
pub const CONFIG_FILE: &str = "config.toml";

/// Canonical agent-instruction file and the legacy siblings it replaces.
pub const INSTRUCTIONS_FILE: &str = "AGENTS.md";
pub const LEGACY_INSTRUCTION_FILES: &[&str] = &["CLAUDE.md", "GEMINI.md"];

/// Descriptor file identifying a skill directory.
pub const SKILL_DESCRIPTOR: &str = "SKILL.md";

/// Sessions retained by default after pruning.
pub const DEFAULT_KEEP_SESSIONS: usize = 20;

/// Temporary filename suffix used when staging a symlink before rename.
pub const TMP_SUFFIX: &str = ".canonlink.tmp";

/// UUIDv5 namespace tag for deterministic plan/task ids.
pub const NS_TAG: &str = "https://canonlink.dev/plan";

/// Seed content for a freshly created canonical `AGENTS.md`.
pub const DEFAULT_INSTRUCTIONS_TEMPLATE: &str = "# AGENTS.md

Shared instructions for every coding agent linked to this directory.
Edit this file once; each client sees it through a symlink.
";
