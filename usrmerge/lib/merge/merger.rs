use std::{io, path::PathBuf};

use getset::Getters;
use tokio::fs;

use crate::{
    merge::{copy_tree, CopyMode},
    utils::{
        canonical_dir, rebase, DPKG_INFO_DIR, ROOTFS_MOUNT_DIR, USR_IS_MERGED_SCRIPTS,
        USR_MERGE_DIRS,
    },
    UsrMergeError, UsrMergeResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The decision taken for a single legacy directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The directory does not exist on the filesystem being processed.
    Missing,

    /// The legacy path is already a symlink, left over from a previous merge.
    AlreadyMerged,

    /// The directory's contents were copied under `/usr` and the directory
    /// was replaced with a symlink.
    Merged,
}

/// Merges the legacy top-level directories of a Debian root filesystem into
/// `/usr`, replacing each with a symlink.
///
/// Every directory in [`USR_MERGE_DIRS`] is processed in order: missing
/// directories are skipped, directories that are already symlinks are left
/// alone, and real directories are copied into their canonical `/usr`
/// location, removed, and replaced with a symlink. The first failing copy,
/// remove, or symlink step aborts the run; directories merged before the
/// failure stay merged, and re-running after the underlying problem is fixed
/// picks up where the failed run left off.
///
/// The symlink target string is always the plain canonical path (for example
/// `/usr/bin`), never rebased, so the links are correct for the filesystem
/// once it boots.
///
/// # Example
/// ```no_run
/// use usrmerge::{merge::UsrMerger, UsrMergeResult};
///
/// #[tokio::main]
/// async fn main() -> UsrMergeResult<()> {
///     let merger = UsrMerger::live_root();
///     merger.merge().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Getters)]
#[getset(get = "pub with_prefix")]
pub struct UsrMerger {
    /// Root that receives the canonical `/usr` directories and the legacy
    /// symlinks. `/` in production, a scratch directory in tests.
    target_root: PathBuf,

    /// Mount prefix under which the legacy directories are read when
    /// processing an offline image. `None` reads them under the target root.
    source_root: Option<PathBuf>,

    /// Whether the obsolete `usr-is-merged` maintainer scripts are removed
    /// once all directories are processed.
    cleanup_markers: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl UsrMerger {
    /// Creates a merger with an explicit configuration.
    pub fn new(
        target_root: impl Into<PathBuf>,
        source_root: Option<PathBuf>,
        cleanup_markers: bool,
    ) -> Self {
        Self {
            target_root: target_root.into(),
            source_root,
            cleanup_markers,
        }
    }

    /// Creates a merger for the currently running root filesystem.
    ///
    /// Legacy directories are read and replaced directly under `/`, and the
    /// obsolete `usr-is-merged` maintainer scripts are removed afterwards.
    pub fn live_root() -> Self {
        Self::new("/", None, true)
    }

    /// Creates a merger for a root filesystem image mounted at `/rootfs`.
    ///
    /// Legacy directories are read (and removed) under the mount prefix;
    /// the canonical directories and symlinks land under `/`.
    pub fn mounted_rootfs() -> Self {
        Self::new("/", Some(ROOTFS_MOUNT_DIR.into()), false)
    }

    /// Merges every legacy directory in [`USR_MERGE_DIRS`], in order.
    ///
    /// ## Returns
    /// One `(directory, outcome)` pair per legacy directory, in list order.
    ///
    /// ## Errors
    /// Returns the first copy, remove, or symlink failure and stops
    /// processing further directories. No rollback is attempted; the
    /// operation is idempotent and can be re-run.
    pub async fn merge(&self) -> UsrMergeResult<Vec<(&'static str, MergeOutcome)>> {
        let mut outcomes = Vec::with_capacity(USR_MERGE_DIRS.len());
        for dir in USR_MERGE_DIRS {
            outcomes.push((*dir, self.merge_dir(dir).await?));
        }

        if self.cleanup_markers {
            self.remove_marker_scripts().await;
        }

        Ok(outcomes)
    }

    /// Merges a single legacy directory into its canonical `/usr` location.
    async fn merge_dir(&self, dir: &str) -> UsrMergeResult<MergeOutcome> {
        let source_base = self.source_root.as_deref().unwrap_or(&self.target_root);
        let legacy_dir = rebase(dir, source_base);

        // Non-following stat, so a symlink at the legacy path is seen as the
        // link itself rather than whatever it points to.
        let metadata = match fs::symlink_metadata(&legacy_dir).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Not every architecture ships every legacy directory.
                tracing::debug!("{} does not exist, skipping", legacy_dir.display());
                return Ok(MergeOutcome::Missing);
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.file_type().is_symlink() {
            tracing::info!("{} is already usr merged", dir);
            return Ok(MergeOutcome::AlreadyMerged);
        }

        let canonical = canonical_dir(dir);
        let canonical_dst = rebase(&canonical, &self.target_root);
        let link_path = rebase(dir, &self.target_root);

        tracing::info!("merging {} into {}", dir, canonical.display());

        copy_tree(&legacy_dir, &canonical_dst, CopyMode::PreserveSymlinksShallow)
            .await
            .map_err(|source| UsrMergeError::CopyDirectory {
                legacy: legacy_dir.display().to_string(),
                canonical: canonical_dst.display().to_string(),
                source,
            })?;

        fs::remove_dir_all(&legacy_dir)
            .await
            .map_err(|source| UsrMergeError::RemoveDirectory {
                legacy: legacy_dir.display().to_string(),
                source,
            })?;

        fs::symlink(&canonical, &link_path)
            .await
            .map_err(|source| UsrMergeError::SymlinkDirectory {
                legacy: link_path.display().to_string(),
                canonical: canonical.display().to_string(),
                source,
            })?;

        Ok(MergeOutcome::Merged)
    }

    /// Removes the obsolete `usr-is-merged` maintainer scripts.
    ///
    /// Absence is not an error, and other removal failures only warn; the
    /// merge itself has already succeeded by the time this runs.
    async fn remove_marker_scripts(&self) {
        let info_dir = rebase(DPKG_INFO_DIR, &self.target_root);
        for script in USR_IS_MERGED_SCRIPTS {
            let script_path = info_dir.join(script);
            match fs::remove_file(&script_path).await {
                Ok(()) => {
                    tracing::info!("removed obsolete maintainer script {}", script_path.display())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("failed to remove {}: {}", script_path.display(), e)
                }
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
