//! Non-mutating filesystem queries used by the planner, scanner and journal.
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

use super::paths::{normalize, relative_link_text};
use crate::types::EntryKind;

/// Kind of filesystem node found at a path, without following a final symlink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathKind {
    Missing,
    File,
    Dir,
    Symlink,
    Other,
}

impl PathKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PathKind::Missing => "missing",
            PathKind::File => "file",
            PathKind::Dir => "dir",
            PathKind::Symlink => "symlink",
            PathKind::Other => "other",
        }
    }

    #[must_use]
    pub const fn exists(self) -> bool {
        !matches!(self, PathKind::Missing)
    }

    /// Whether a node of this kind satisfies an expected entry kind.
    #[must_use]
    pub fn matches(self, kind: EntryKind) -> bool {
        matches!(
            (self, kind),
            (PathKind::File, EntryKind::File) | (PathKind::Dir, EntryKind::Dir)
        )
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the node at `path` (a symlink is reported as such, dangling or not).
pub fn kind_of(path: &Path) -> PathKind {
    match std::fs::symlink_metadata(path) {
        Ok(md) => {
            let ft = md.file_type();
            if ft.is_symlink() {
                PathKind::Symlink
            } else if ft.is_file() {
                PathKind::File
            } else if ft.is_dir() {
                PathKind::Dir
            } else {
                PathKind::Other
            }
        }
        Err(_) => PathKind::Missing,
    }
}

/// Classify the node at `path`, following symlinks. Dangling links are `Missing`.
pub fn kind_following(path: &Path) -> PathKind {
    match std::fs::metadata(path) {
        Ok(md) if md.is_file() => PathKind::File,
        Ok(md) if md.is_dir() => PathKind::Dir,
        Ok(_) => PathKind::Other,
        Err(_) => PathKind::Missing,
    }
}

pub fn is_symlink(path: &Path) -> bool {
    kind_of(path) == PathKind::Symlink
}

/// Physical directory of `dir`: symlinks along the way resolved, or the
/// lexical form when it does not exist.
fn physical_dir(dir: &Path) -> PathBuf {
    std::fs::canonicalize(dir).unwrap_or_else(|_| normalize(dir))
}

/// If `target` is a symlink, resolve its stored text to an absolute,
/// normalized path. Relative text is taken from the link's physical parent,
/// as the kernel does when the parent itself sits behind a symlink.
pub fn resolve_symlink_target(target: &Path) -> Option<PathBuf> {
    if !is_symlink(target) {
        return None;
    }
    let mut link = std::fs::read_link(target).ok()?;
    if link.is_relative() {
        if let Some(parent) = target.parent() {
            link = physical_dir(parent).join(link);
        }
    }
    Some(normalize(&link))
}

/// Text a symlink at `target` must store to reach `source`.
///
/// Lexical unless the link's directory is reached through a symlink (e.g.
/// `~/.claude -> dotfiles/claude`); then both ends are taken physically,
/// since `..` in link text climbs the real directory.
pub fn link_text_for(target: &Path, source: &Path) -> PathBuf {
    let lexical = relative_link_text(target, source);
    let (Some(parent), Some(name)) = (target.parent(), target.file_name()) else {
        return lexical;
    };
    let Ok(real_parent) = std::fs::canonicalize(parent) else {
        return lexical;
    };
    if real_parent == normalize(parent) {
        return lexical;
    }
    let real_source = match (source.parent(), source.file_name()) {
        (Some(dir), Some(leaf)) => physical_dir(dir).join(leaf),
        _ => normalize(source),
    };
    relative_link_text(&real_parent.join(name), &real_source)
}

/// Two paths name the same location, lexically or after canonicalization.
pub fn same_location(a: &Path, b: &Path) -> bool {
    if normalize(a) == normalize(b) {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// Compute SHA-256 of a file at `path`, returning a lowercase hex string.
pub fn sha256_hex_of(path: &Path) -> Option<String> {
    let mut f = std::fs::File::open(path).ok()?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut f, &mut hasher).ok()?;
    Some(hex::encode(hasher.finalize()))
}
