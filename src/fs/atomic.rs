//! Symlink creation primitives.
//!
//! On unix a link is staged under a temporary name inside the target's parent
//! (opened `O_DIRECTORY`, following symlinks so a dotfiles-managed client
//! directory works), then `renameat`-ed over the final name so readers never
//! observe a half-made link. The final component itself is never followed.
use std::fs;
use std::path::Path;

use crate::types::EntryKind;

#[cfg(unix)]
mod imp {
    use std::path::Path;
    use std::sync::atomic::{AtomicU64, Ordering};

    use rustix::fd::OwnedFd;
    use rustix::fs::{openat, renameat, symlinkat, unlinkat, AtFlags, Mode, OFlags, CWD};
    use rustix::io::Errno;

    use crate::constants::TMP_SUFFIX;

    fn errno_to_io(e: Errno) -> std::io::Error {
        std::io::Error::from_raw_os_error(e.raw_os_error())
    }

    fn cstring(bytes: &[u8]) -> std::io::Result<std::ffi::CString> {
        std::ffi::CString::new(bytes)
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid cstring"))
    }

    static NEXT_TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

    pub(super) fn open_dir(dir: &Path) -> std::io::Result<OwnedFd> {
        use std::os::unix::ffi::OsStrExt;
        let c = cstring(dir.as_os_str().as_bytes())?;
        openat(
            CWD,
            c.as_c_str(),
            OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(errno_to_io)
    }

    pub(super) fn symlink_via_rename(link_text: &Path, target: &Path) -> std::io::Result<()> {
        use std::os::unix::ffi::OsStrExt;
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        let fname = target.file_name().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no file name")
        })?;
        let ctr = NEXT_TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            ".{}.{}.{ctr}{TMP_SUFFIX}",
            fname.to_string_lossy(),
            std::process::id()
        );

        let dirfd = open_dir(parent)?;
        let tmp_c = cstring(tmp_name.as_bytes())?;
        match unlinkat(&dirfd, tmp_c.as_c_str(), AtFlags::empty()) {
            Ok(()) => {}
            Err(e) if e == Errno::NOENT => {}
            Err(e) => return Err(errno_to_io(e)),
        }
        let src_c = cstring(link_text.as_os_str().as_bytes())?;
        symlinkat(src_c.as_c_str(), &dirfd, tmp_c.as_c_str()).map_err(errno_to_io)?;

        let new_c = cstring(fname.as_bytes())?;
        if let Err(e) = renameat(&dirfd, tmp_c.as_c_str(), &dirfd, new_c.as_c_str()) {
            let _ = unlinkat(&dirfd, tmp_c.as_c_str(), AtFlags::empty());
            return Err(errno_to_io(e));
        }
        let _ = rustix::fs::fsync(&dirfd);
        Ok(())
    }

    pub(super) fn is_cross_device(e: &std::io::Error) -> bool {
        e.raw_os_error() == Some(Errno::XDEV.raw_os_error())
    }
}

/// Create a symlink at `target` storing `link_text`. Directory links use a
/// junction-capable type on Windows, files a plain file link.
///
/// # Errors
///
/// Returns an IO error if the parent cannot be opened or the link cannot be
/// created or renamed into place.
pub fn create_symlink(link_text: &Path, target: &Path, kind: EntryKind) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let _ = kind;
        imp::symlink_via_rename(link_text, target)
    }
    #[cfg(windows)]
    {
        match kind {
            EntryKind::Dir => std::os::windows::fs::symlink_dir(link_text, target),
            EntryKind::File => std::os::windows::fs::symlink_file(link_text, target),
        }
    }
}

/// Recreate a symlink verbatim (used when copying or moving link entries).
pub(crate) fn clone_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    let text = fs::read_link(from)?;
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(text, to)
    }
    #[cfg(windows)]
    {
        if fs::metadata(from).map(|m| m.is_dir()).unwrap_or(false) {
            std::os::windows::fs::symlink_dir(text, to)
        } else {
            std::os::windows::fs::symlink_file(text, to)
        }
    }
}

/// Rename failed because source and destination are on different filesystems.
pub(crate) fn is_cross_device(e: &std::io::Error) -> bool {
    #[cfg(unix)]
    {
        imp::is_cross_device(e)
    }
    #[cfg(not(unix))]
    {
        let _ = e;
        false
    }
}

/// Fsync the parent directory of `path` for durability.
///
/// # Errors
///
/// Returns an IO error if the parent directory cannot be opened or fsynced.
pub fn fsync_parent_dir(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        let dir = fs::File::open(parent)?;
        dir.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
