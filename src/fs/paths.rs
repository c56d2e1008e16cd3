//! Lexical path helpers: normalization and relative link text.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize `path`: drop `.` segments and fold `..` into the
/// preceding segment. Never touches the filesystem.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Text a symlink at `link` must store to reach `source`, expressed relative
/// to the link's own directory. Falls back to the absolute source when the
/// two share no root (e.g. different drive prefixes).
#[must_use]
pub fn relative_link_text(link: &Path, source: &Path) -> PathBuf {
    let from = normalize(link.parent().unwrap_or_else(|| Path::new("")));
    let to = normalize(source);
    let from_c: Vec<Component<'_>> = from.components().collect();
    let to_c: Vec<Component<'_>> = to.components().collect();

    let common = from_c
        .iter()
        .zip(to_c.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let shares_root = match (from_c.first(), to_c.first()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    if !shares_root {
        return to;
    }

    let mut rel = PathBuf::new();
    for _ in common..from_c.len() {
        rel.push("..");
    }
    for c in &to_c[common..] {
        rel.push(c.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

/// Human label for `path`: relative to `root` when inside it, else the base name.
#[must_use]
pub fn label_for(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    }
}

/// A single, non-empty path segment without separators or dot-names.
#[must_use]
pub fn is_safe_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}
