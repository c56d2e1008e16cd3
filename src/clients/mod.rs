//! Client tools, their on-disk layouts, and root resolution.
//!
//! Everything here is a pure function of its inputs; nothing reads the
//! environment or the current directory.

pub mod mappings;
pub mod skills;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::CANONICAL_DIR;
use crate::types::errors::{Error, ErrorKind, Result};
use crate::types::EntryKind;

pub use mappings::mappings;
pub use skills::{find_skill_dirs, parse_skill_descriptor, SkillDescriptor};

/// Where the canonical tree and client trees live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Global,
    Project,
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "global" => Ok(Scope::Global),
            "project" => Ok(Scope::Project),
            other => Err(format!("unknown scope: {other} (expected global or project)")),
        }
    }
}

/// A third-party tool that reads a slice of the canonical tree.
///
/// Declaration order is priority order; scans and conflict candidates follow it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Client {
    Claude,
    Factory,
    Codex,
    Gemini,
    Cursor,
    Opencode,
}

/// Directory-shaped content categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Commands,
    Hooks,
    Skills,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Commands, Category::Hooks, Category::Skills];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Commands => "commands",
            Category::Hooks => "hooks",
            Category::Skills => "skills",
        }
    }

    /// Kind of the children projected from this category.
    #[must_use]
    pub const fn entry_kind(self) -> EntryKind {
        match self {
            Category::Commands | Category::Hooks => EntryKind::File,
            Category::Skills => EntryKind::Dir,
        }
    }
}

impl Client {
    pub const ALL: [Client; 6] = [
        Client::Claude,
        Client::Factory,
        Client::Codex,
        Client::Gemini,
        Client::Cursor,
        Client::Opencode,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Client::Claude => "claude",
            Client::Factory => "factory",
            Client::Codex => "codex",
            Client::Gemini => "gemini",
            Client::Cursor => "cursor",
            Client::Opencode => "opencode",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Client::Claude => "Claude Code",
            Client::Factory => "Factory Droid",
            Client::Codex => "Codex",
            Client::Gemini => "Gemini CLI",
            Client::Cursor => "Cursor",
            Client::Opencode => "OpenCode",
        }
    }

    /// Name of the client's directory for `category`, if it reads one.
    #[must_use]
    pub const fn category_dir(self, category: Category) -> Option<&'static str> {
        match (self, category) {
            (Client::Claude | Client::Factory | Client::Cursor, Category::Commands) => {
                Some("commands")
            }
            (Client::Codex, Category::Commands) => Some("prompts"),
            (Client::Opencode, Category::Commands) => Some("command"),
            (Client::Claude | Client::Factory, Category::Hooks) => Some("hooks"),
            (Client::Claude | Client::Factory | Client::Codex, Category::Skills) => Some("skills"),
            (Client::Opencode, Category::Skills) => Some("skill"),
            _ => None,
        }
    }

    /// Agent-instruction file name the client reads, if any.
    #[must_use]
    pub const fn instructions_file(self) -> Option<&'static str> {
        match self {
            Client::Claude => Some("CLAUDE.md"),
            Client::Factory | Client::Codex | Client::Opencode => Some("AGENTS.md"),
            Client::Gemini => Some("GEMINI.md"),
            Client::Cursor => None,
        }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Client {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Client::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown client: {s}"))
    }
}

/// Resolved absolute roots for one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roots {
    pub scope: Scope,
    /// Home directory (global) or project directory (project).
    pub base: PathBuf,
    pub canonical: PathBuf,
}

impl Roots {
    /// Resolve roots for `scope`. Global scope needs `home_dir`, project scope
    /// needs `project_root`; both must be absolute.
    pub fn resolve(scope: Scope, project_root: Option<&Path>, home_dir: Option<&Path>) -> Result<Self> {
        let base = match scope {
            Scope::Global => home_dir.ok_or_else(|| {
                Error::new(ErrorKind::InvalidPath, "global scope requires a home directory")
            })?,
            Scope::Project => project_root.ok_or_else(|| {
                Error::new(ErrorKind::InvalidPath, "project scope requires a project root")
            })?,
        };
        if !base.is_absolute() {
            return Err(Error::new(
                ErrorKind::InvalidPath,
                format!("root must be absolute: {}", base.display()),
            ));
        }
        Ok(Self {
            scope,
            base: base.to_path_buf(),
            canonical: base.join(CANONICAL_DIR),
        })
    }

    /// Root of a client's own configuration directory.
    pub fn client_root(&self, client: Client) -> PathBuf {
        match (self.scope, client) {
            (Scope::Global, Client::Opencode) => self.base.join(".config").join("opencode"),
            _ => self.base.join(format!(".{}", client.as_str())),
        }
    }

    pub fn category_path(&self, client: Client, category: Category) -> Option<PathBuf> {
        client
            .category_dir(category)
            .map(|dir| self.client_root(client).join(dir))
    }

    /// Instruction files live in the client root globally and at the project
    /// root for project scope.
    pub fn instructions_path(&self, client: Client) -> Option<PathBuf> {
        let file = client.instructions_file()?;
        Some(match self.scope {
            Scope::Global => self.client_root(client).join(file),
            Scope::Project => self.base.join(file),
        })
    }
}
