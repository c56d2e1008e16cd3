use std::path::PathBuf;

use super::{Category, Client};
use crate::config::Options;
use crate::constants::{INSTRUCTIONS_FILE, LEGACY_INSTRUCTION_FILES};
use crate::types::errors::Result;
use crate::types::{EntryKind, Mapping};

/// Agent-instruction mappings and the clients each one serves.
const INSTRUCTION_MAPPINGS: [(&str, &[Client]); 3] = [
    ("claude-md", &[Client::Claude]),
    ("agents-md", &[Client::Factory, Client::Codex, Client::Opencode]),
    ("gemini-md", &[Client::Gemini]),
];

fn push_unique(targets: &mut Vec<PathBuf>, path: PathBuf) {
    if !targets.contains(&path) {
        targets.push(path);
    }
}

/// Mappings for the enabled clients, in fixed order: `commands`, `hooks`,
/// `skills`, then the instruction mappings. A mapping no enabled client
/// reads is left out.
pub fn mappings(options: &Options) -> Result<Vec<Mapping>> {
    let roots = &options.roots;
    let canonical = &roots.canonical;
    let mut out = Vec::new();

    for category in Category::ALL {
        let mut targets = Vec::new();
        for &client in &options.clients {
            if let Some(path) = roots.category_path(client, category) {
                push_unique(&mut targets, path);
            }
        }
        if targets.is_empty() {
            continue;
        }
        let source = canonical.join(category.as_str());
        out.push(
            Mapping::new(category.as_str(), canonical, &source, EntryKind::Dir, targets)?
                .per_entry(category.entry_kind())?,
        );
    }

    let source = canonical.join(INSTRUCTIONS_FILE);
    let relinkable: Vec<PathBuf> = LEGACY_INSTRUCTION_FILES
        .iter()
        .map(|f| canonical.join(f))
        .collect();
    for (name, served) in INSTRUCTION_MAPPINGS {
        let mut targets = Vec::new();
        for &client in options.clients.iter().filter(|c| served.contains(c)) {
            if let Some(path) = roots.instructions_path(client) {
                push_unique(&mut targets, path);
            }
        }
        if targets.is_empty() {
            continue;
        }
        out.push(
            Mapping::new(name, canonical, &source, EntryKind::File, targets)?
                .with_relinkable(relinkable.clone()),
        );
    }
    Ok(out)
}
