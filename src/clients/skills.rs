//! `SKILL.md` descriptors: YAML frontmatter naming a skill directory.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::constants::SKILL_DESCRIPTOR;
use crate::fs::paths::is_safe_segment;
use crate::types::errors::{Error, ErrorKind, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillDescriptor {
    pub name: String,
    pub description: String,
}

#[derive(Deserialize)]
struct Frontmatter {
    name: Option<String>,
    description: Option<String>,
}

fn frontmatter(text: &str) -> Option<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;
    let mut offset = 0usize;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

fn required(field: Option<String>, what: &str, path: &Path) -> Result<String> {
    match field.map(|s| s.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::new(
            ErrorKind::Descriptor,
            format!("{}: missing {what}", path.display()),
        )),
    }
}

/// Parse the frontmatter of a `SKILL.md` file.
///
/// `name` and `description` are required, and `name` must be usable as a
/// single directory name since it decides where the skill lands.
pub fn parse_skill_descriptor(path: &Path) -> Result<SkillDescriptor> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::new(ErrorKind::Io, format!("{}: {e}", path.display())))?;
    let yaml = frontmatter(&text).ok_or_else(|| {
        Error::new(
            ErrorKind::Descriptor,
            format!("{}: no frontmatter", path.display()),
        )
    })?;
    let fm: Frontmatter = serde_yaml::from_str(yaml)
        .map_err(|e| Error::new(ErrorKind::Descriptor, format!("{}: {e}", path.display())))?;
    let name = required(fm.name, "name", path)?;
    if !is_safe_segment(&name) {
        return Err(Error::new(
            ErrorKind::Descriptor,
            format!("{}: unusable skill name {name:?}", path.display()),
        ));
    }
    let description = required(fm.description, "description", path)?;
    Ok(SkillDescriptor { name, description })
}

/// Directories under `root` holding a valid descriptor, in path order.
///
/// Symlinks are never followed, hidden directories are skipped, and the
/// search does not descend into a skill once found. Invalid descriptors are
/// logged and skipped.
pub fn find_skill_dirs(root: &Path) -> Vec<(PathBuf, SkillDescriptor)> {
    let mut out = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();
    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            walker.skip_current_dir();
            continue;
        }
        let descriptor = entry.path().join(SKILL_DESCRIPTOR);
        if !descriptor.is_file() {
            continue;
        }
        match parse_skill_descriptor(&descriptor) {
            Ok(desc) => {
                out.push((entry.path().to_path_buf(), desc));
                walker.skip_current_dir();
            }
            Err(e) => log::debug!("skipping skill at {}: {e}", entry.path().display()),
        }
    }
    out
}
