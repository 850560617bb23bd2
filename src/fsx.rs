//! Cross-platform filesystem capabilities.
//!
//! The archive format stores symlink targets and an executable flag that only
//! POSIX filesystems can fully honor. Everything platform-conditional about
//! materializing entries lives here, so the extractor itself stays free of
//! `cfg` branches.

use std::fs;
use std::io;
use std::path::Path;

/// Create a link-like entry at `path` pointing at `target`.
///
/// On Unix this is a real symbolic link. On platforms without a native
/// symlink primitive the entry becomes a plain text file containing the
/// target string — a documented, lossy fallback.
#[cfg(unix)]
pub fn create_link_entry(target: &str, path: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, path)
}

#[cfg(not(unix))]
pub fn create_link_entry(target: &str, path: &Path) -> io::Result<()> {
    fs::write(path, target)
}

/// True when the owner-execute permission bit is set.
#[cfg(unix)]
pub fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
pub fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

/// Restore the execute bits on an extracted file (mode `0o775`).
#[cfg(unix)]
pub fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o775))
}

/// No-op: POSIX permission bits are not preserved on this platform.
#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
