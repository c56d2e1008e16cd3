use std::path::{Component, Path, PathBuf};

use super::errors::{Error, ErrorKind, Result};

/// A path proven to live under a root, kept as root + relative part.
///
/// Mapping sources are held as `SafePath` so a mapping can never point a
/// client at something outside the canonical tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafePath {
    root: PathBuf,
    rel: PathBuf,
}

impl SafePath {
    /// Creates a new SafePath from a root and candidate path.
    ///
    /// The candidate may be absolute (it must then start with `root`) or
    /// relative to `root`. `..` segments and prefix/root components inside a
    /// relative candidate are rejected; `.` segments are dropped.
    pub fn from_rooted(root: &Path, candidate: &Path) -> Result<Self> {
        if !root.is_absolute() {
            return Err(Error::new(ErrorKind::InvalidPath, "root must be absolute"));
        }
        let effective = if candidate.is_absolute() {
            match candidate.strip_prefix(root) {
                Ok(p) => p.to_path_buf(),
                Err(_) => return Err(Error::new(ErrorKind::Policy, "path escapes root")),
            }
        } else {
            candidate.to_path_buf()
        };

        let mut rel = PathBuf::new();
        for seg in effective.components() {
            match seg {
                Component::CurDir => {}
                Component::Normal(p) => rel.push(p),
                Component::ParentDir => return Err(Error::new(ErrorKind::Policy, "dotdot")),
                _ => {
                    return Err(Error::new(
                        ErrorKind::InvalidPath,
                        "unsupported component",
                    ))
                }
            }
        }
        Ok(SafePath {
            root: root.to_path_buf(),
            rel,
        })
    }

    /// Returns the full path by joining the root and relative components.
    pub fn as_path(&self) -> PathBuf {
        self.root.join(&self.rel)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rel(&self) -> &Path {
        &self.rel
    }
}
