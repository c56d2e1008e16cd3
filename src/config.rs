//! Invocation options and the optional `<canonical>/config.toml`.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clients::{Client, Roots, Scope};
use crate::constants::{CONFIG_FILE, DEFAULT_KEEP_SESSIONS};

/// How many finalized journal sessions survive pruning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRetention {
    #[serde(default = "default_keep")]
    pub keep: usize,
}

fn default_keep() -> usize {
    DEFAULT_KEEP_SESSIONS
}

fn default_clients() -> Vec<Client> {
    Client::ALL.to_vec()
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self {
            keep: default_keep(),
        }
    }
}

/// Contents of `config.toml`.
///
/// ```toml
/// clients = ["claude", "codex"]
///
/// [backups]
/// keep = 10
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_clients")]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub backups: BackupRetention,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clients: default_clients(),
            backups: BackupRetention::default(),
        }
    }
}

impl Config {
    /// Load `<canonical_root>/config.toml`. A missing or unparsable file
    /// yields the defaults.
    pub fn load(canonical_root: &Path) -> Self {
        let path = canonical_root.join(CONFIG_FILE);
        let Ok(contents) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

/// Everything a scan, plan or apply call needs, passed explicitly.
#[derive(Clone, Debug)]
pub struct Options {
    pub scope: Scope,
    pub roots: Roots,
    /// Enabled clients in priority order, without duplicates.
    pub clients: Vec<Client>,
    pub backups: BackupRetention,
}

impl Options {
    pub fn new(roots: Roots, clients: impl IntoIterator<Item = Client>) -> Self {
        let mut clients: Vec<Client> = clients.into_iter().collect();
        clients.sort();
        clients.dedup();
        Self {
            scope: roots.scope,
            roots,
            clients,
            backups: BackupRetention::default(),
        }
    }

    /// Options with the clients and retention named by `config`.
    pub fn from_config(roots: Roots, config: &Config) -> Self {
        Self::new(roots, config.clients.iter().copied()).with_backups(config.backups)
    }

    #[must_use]
    pub fn with_backups(mut self, backups: BackupRetention) -> Self {
        self.backups = backups;
        self
    }

    pub fn canonical_root(&self) -> &Path {
        &self.roots.canonical
    }
}
