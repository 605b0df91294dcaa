//! Path constants and helpers for the usr-merge transition.

use std::path::{Path, PathBuf};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The legacy top-level directories that can be merged into `/usr`.
///
/// Not every architecture ships every entry; directories that do not exist
/// are skipped. The order is fixed so runs log deterministically, but each
/// directory is processed independently.
pub const USR_MERGE_DIRS: &[&str] = &[
    "/bin", "/lib", "/lib32", "/lib64", "/libo32", "/libx32", "/sbin",
];

/// The directory where an offline root filesystem image is mounted.
pub const ROOTFS_MOUNT_DIR: &str = "/rootfs";

/// The directory where dpkg keeps maintainer scripts.
pub const DPKG_INFO_DIR: &str = "/var/lib/dpkg/info";

/// The obsolete `usr-is-merged` maintainer scripts removed after a live-root merge.
pub const USR_IS_MERGED_SCRIPTS: &[&str] = &["usr-is-merged.preinst", "usr-is-merged.postinst"];

/// The canonical directory the legacy directories are merged into.
pub const USR_DIR: &str = "/usr";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Rebases an absolute path onto another root directory.
///
/// `rebase("/bin", "/rootfs")` yields `/rootfs/bin`, and rebasing onto `/`
/// leaves the path unchanged. A relative path is joined as-is.
pub fn rebase(path: impl AsRef<Path>, root: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let relative = path.strip_prefix("/").unwrap_or(path);
    root.as_ref().join(relative)
}

/// Returns the canonical `/usr` path for a legacy directory.
pub fn canonical_dir(legacy_dir: impl AsRef<Path>) -> PathBuf {
    rebase(legacy_dir, USR_DIR)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
