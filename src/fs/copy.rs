//! Whole-entry copy, move and removal helpers. None of them follow a final
//! symlink: a link is copied, moved or removed as a link.
use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use super::atomic::{clone_symlink, is_cross_device};
use super::meta::{kind_of, PathKind};

/// Copy `src` to `dst`, overwriting whatever files already sit at the
/// destination. Directories are copied recursively; nested symlinks are
/// recreated with their stored text.
pub fn copy_entry(src: &Path, dst: &Path) -> io::Result<()> {
    match kind_of(src) {
        PathKind::Missing => Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("copy source missing: {}", src.display()),
        )),
        PathKind::Symlink => {
            remove_entry(dst)?;
            clone_symlink(src, dst)
        }
        PathKind::Dir => copy_tree(src, dst),
        PathKind::File | PathKind::Other => {
            if kind_of(dst) == PathKind::Symlink {
                fs::remove_file(dst)?;
            }
            fs::copy(src, dst).map(|_| ())
        }
    }
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let out = if rel.as_os_str().is_empty() {
            dst.to_path_buf()
        } else {
            dst.join(rel)
        };
        let ft = entry.file_type();
        if ft.is_dir() {
            if kind_of(&out) != PathKind::Dir {
                remove_entry(&out)?;
                fs::create_dir_all(&out)?;
            }
        } else if ft.is_symlink() {
            remove_entry(&out)?;
            clone_symlink(entry.path(), &out)?;
        } else {
            if matches!(kind_of(&out), PathKind::Symlink | PathKind::Dir) {
                remove_entry(&out)?;
            }
            fs::copy(entry.path(), &out)?;
        }
    }
    Ok(())
}

/// Move `src` to `dst`. Falls back to copy-then-remove across filesystems.
pub fn move_entry(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            copy_entry(src, dst)?;
            remove_entry(src).map(|_| ())
        }
        Err(e) => Err(e),
    }
}

/// Remove whatever sits at `path`. Returns `false` when nothing was there.
pub fn remove_entry(path: &Path) -> io::Result<bool> {
    match kind_of(path) {
        PathKind::Missing => Ok(false),
        PathKind::Dir => fs::remove_dir_all(path).map(|()| true),
        PathKind::Symlink => remove_symlink(path).map(|()| true),
        PathKind::File | PathKind::Other => fs::remove_file(path).map(|()| true),
    }
}

fn remove_symlink(path: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        // Directory links on Windows must be removed as directories.
        if fs::remove_file(path).is_err() {
            return fs::remove_dir(path);
        }
        Ok(())
    }
    #[cfg(not(windows))]
    {
        fs::remove_file(path)
    }
}
