use std::{
    fs::FileType,
    io,
    path::{Path, PathBuf},
};

use tokio::fs;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How symbolic links encountered inside a copied tree are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// Follow each symlink and copy whatever it resolves to.
    FollowSymlinks,

    /// Recreate each symlink at the destination with its original target
    /// string, without following it.
    PreserveSymlinksShallow,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Copies the contents of a directory tree into a destination directory.
///
/// The destination and any intermediate directories are created as needed,
/// and source directory permission bits are mirrored onto them. Regular
/// files are copied with [`fs::copy`], which carries their permission bits.
/// Special files (FIFOs, sockets, device nodes) are skipped.
///
/// Entries already present at the destination are replaced: regular files
/// are overwritten in place, while an entry that would make a write go
/// through a symlink is removed first.
///
/// In [`CopyMode::FollowSymlinks`] every link is dereferenced, so the copy
/// will not terminate on a symlink cycle; [`CopyMode::PreserveSymlinksShallow`]
/// recreates links verbatim and is immune by construction.
///
/// # Arguments
/// * `source_dir` - Source directory to copy from
/// * `dest_dir` - Destination directory to copy to
/// * `mode` - How symlinks inside the tree are handled
///
/// # Errors
/// Returns error if:
/// * Failed to read the source directory
/// * Failed to create a destination directory
/// * Failed to copy a file or recreate a symlink
/// * Failed to set permissions
pub async fn copy_tree(
    source_dir: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
    mode: CopyMode,
) -> io::Result<()> {
    let source_dir = source_dir.as_ref();
    let dest_dir = dest_dir.as_ref();

    let mut stack = vec![(source_dir.to_path_buf(), dest_dir.to_path_buf())];
    let mut dir_modes: Vec<(PathBuf, std::fs::Permissions)> = Vec::new();

    while let Some((current_src, current_dst)) = stack.pop() {
        fs::create_dir_all(&current_dst).await?;

        // Recorded now, applied once the whole tree is copied; a read-only
        // directory applied up front would block writes into it.
        let dir_metadata = fs::metadata(&current_src).await?;
        dir_modes.push((current_dst.clone(), dir_metadata.permissions()));

        let mut entries = fs::read_dir(&current_src).await?;
        while let Some(entry) = entries.next_entry().await? {
            let src_path = entry.path();
            let dst_path = current_dst.join(entry.file_name());

            let file_type = match mode {
                CopyMode::PreserveSymlinksShallow => {
                    fs::symlink_metadata(&src_path).await?.file_type()
                }
                CopyMode::FollowSymlinks => fs::metadata(&src_path).await?.file_type(),
            };

            if file_type.is_dir() {
                stack.push((src_path, dst_path));
            } else if file_type.is_file() {
                tracing::debug!(
                    "copying file {} -> {}",
                    src_path.display(),
                    dst_path.display()
                );

                // fs::copy overwrites a regular file in place, but would
                // write through a symlink sitting at the destination name.
                if let Ok(existing) = fs::symlink_metadata(&dst_path).await {
                    if !existing.file_type().is_file() {
                        remove_existing(&dst_path, existing.file_type()).await?;
                    }
                }

                fs::copy(&src_path, &dst_path).await?;
            } else if file_type.is_symlink() {
                let link_target = fs::read_link(&src_path).await?;
                tracing::debug!(
                    "recreating symlink {} -> {}",
                    dst_path.display(),
                    link_target.display()
                );

                if let Ok(existing) = fs::symlink_metadata(&dst_path).await {
                    remove_existing(&dst_path, existing.file_type()).await?;
                }

                fs::symlink(&link_target, &dst_path).await?;
            } else {
                tracing::debug!("skipping special file {}", src_path.display());
            }
        }
    }

    // Children before parents, so a read-only parent cannot lock out its own
    // subtree.
    for (dir, permissions) in dir_modes.into_iter().rev() {
        fs::set_permissions(&dir, permissions).await?;
    }

    Ok(())
}

/// Removes an entry occupying a destination name, whatever its type.
async fn remove_existing(path: &Path, file_type: FileType) -> io::Result<()> {
    if file_type.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
