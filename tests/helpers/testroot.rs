// A per-test home directory with path builders for the canonical and client trees.

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(Debug)]
pub struct TestRoot {
    td: tempfile::TempDir,
}

/// What a path holds, for whole-tree comparisons.
#[derive(Debug, PartialEq, Eq)]
pub enum Node {
    Dir,
    File(Vec<u8>),
    Link(PathBuf),
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            td: tempfile::TempDir::new().expect("tempdir"),
        }
    }
    pub fn path(&self) -> &Path {
        self.td.path()
    }
    pub fn join<P: AsRef<Path>>(&self, p: P) -> PathBuf {
        self.path().join(p)
    }
    pub fn canonical<P: AsRef<Path>>(&self, p: P) -> PathBuf {
        self.join(".agents").join(p)
    }

    /// Write `body` at `rel`, creating parents.
    pub fn write<P: AsRef<Path>>(&self, rel: P, body: &str) -> PathBuf {
        let p = self.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, body).unwrap();
        p
    }

    /// Create a symlink at `rel` storing `text`, creating parents.
    pub fn link<P: AsRef<Path>, Q: AsRef<Path>>(&self, rel: P, text: Q) -> PathBuf {
        let p = self.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        symlink(text, &p).unwrap();
        p
    }

    pub fn skill(&self, rel: &str, name: &str) -> PathBuf {
        self.write(
            format!("{rel}/SKILL.md"),
            &format!("---\nname: {name}\ndescription: {name} skill\n---\nbody\n"),
        )
        .parent()
        .unwrap()
        .to_path_buf()
    }

    /// Every path under the root except the journal, with its content.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Node> {
        let mut out = BTreeMap::new();
        for e in WalkDir::new(self.path()).min_depth(1).follow_links(false) {
            let e = e.unwrap();
            let rel = e.path().strip_prefix(self.path()).unwrap().to_path_buf();
            if rel == Path::new(".agents") || rel.starts_with(".agents/.backups") {
                continue;
            }
            let node = if e.file_type().is_symlink() {
                Node::Link(fs::read_link(e.path()).unwrap())
            } else if e.file_type().is_dir() {
                Node::Dir
            } else {
                Node::File(fs::read(e.path()).unwrap())
            };
            out.insert(rel, node);
        }
        out
    }
}

pub fn is_link(p: &Path) -> bool {
    fs::symlink_metadata(p)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testroot_unique() {
        let a = TestRoot::new();
        let b = TestRoot::new();
        assert_ne!(a.path(), b.path());
        a.write(".claude/commands/x.md", "x");
        assert!(a.join(".claude/commands/x.md").exists());
        assert!(!b.join(".claude/commands/x.md").exists());
    }
}
