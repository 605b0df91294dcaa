//! End-to-end merge scenarios against scratch roots.

use std::{os::unix::fs::PermissionsExt, path::PathBuf};

use tempfile::tempdir;
use tokio::fs;
use usrmerge::{
    merge::{MergeOutcome, UsrMerger},
    utils::USR_MERGE_DIRS,
    UsrMergeError,
};

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_merge_skips_missing_directories() -> anyhow::Result<()> {
    let root = tempdir()?;

    let before = helper::snapshot_tree(root.path())?;

    let merger = UsrMerger::new(root.path(), None, false);
    let outcomes = merger.merge().await?;

    assert_eq!(outcomes.len(), USR_MERGE_DIRS.len());
    assert!(outcomes
        .iter()
        .all(|(_, outcome)| *outcome == MergeOutcome::Missing));
    assert_eq!(helper::snapshot_tree(root.path())?, before);

    Ok(())
}

#[test_log::test(tokio::test)]
/// Merges a `/bin` containing regular files, a nested directory, and
/// symlinks of every interesting shape.
///
/// Test Structure:
/// ```text
/// root/                                root/
/// ├── bin/                             ├── bin -> /usr/bin
/// │   ├── ls         (rwxr-xr-x)       └── usr/
/// │   ├── sh       -> /bin/bash            └── bin/
/// │   ├── dangling -> missing-target           ├── ls         (rwxr-xr-x)
/// │   ├── loop     -> loop                     ├── sh       -> /bin/bash
/// │   └── commands/                            ├── dangling -> missing-target
/// │       ├── cat                              ├── loop     -> loop
/// │       └── ls-alias -> ../ls                └── commands/
/// │                                                ├── cat
/// │                                                └── ls-alias -> ../ls
/// ```
async fn test_merge_bin_into_usr() -> anyhow::Result<()> {
    let root = tempdir()?;
    helper::create_legacy_bin(root.path()).await?;

    let merger = UsrMerger::new(root.path(), None, false);
    let outcomes = merger.merge().await?;

    assert_eq!(outcomes[0], ("/bin", MergeOutcome::Merged));
    assert!(outcomes[1..]
        .iter()
        .all(|(_, outcome)| *outcome == MergeOutcome::Missing));

    // Regular files land under the canonical path with identical contents
    let usr_bin = root.path().join("usr/bin");
    assert_eq!(fs::read_to_string(usr_bin.join("ls")).await?, "ls binary");
    assert_eq!(
        std::fs::metadata(usr_bin.join("ls"))?.permissions().mode() & 0o777,
        0o755
    );
    assert_eq!(
        fs::read_to_string(usr_bin.join("commands/cat")).await?,
        "cat binary"
    );

    // Symlinks keep their original target strings, dereferenced never
    for (link, target) in [
        ("sh", "/bin/bash"),
        ("commands/ls-alias", "../ls"),
        ("dangling", "missing-target"),
        ("loop", "loop"),
    ] {
        let link_path = usr_bin.join(link);
        assert!(
            fs::symlink_metadata(&link_path)
                .await?
                .file_type()
                .is_symlink(),
            "{link} should be a symlink"
        );
        assert_eq!(fs::read_link(&link_path).await?, PathBuf::from(target));
    }

    // The legacy path is now a symlink to the canonical directory
    let bin = root.path().join("bin");
    assert!(fs::symlink_metadata(&bin).await?.file_type().is_symlink());
    assert_eq!(fs::read_link(&bin).await?, PathBuf::from("/usr/bin"));

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_merge_twice_is_idempotent() -> anyhow::Result<()> {
    let root = tempdir()?;
    helper::create_legacy_bin(root.path()).await?;
    fs::create_dir(root.path().join("sbin")).await?;
    fs::write(root.path().join("sbin/init"), "init binary").await?;

    let merger = UsrMerger::new(root.path(), None, false);
    merger.merge().await?;
    let after_first = helper::snapshot_tree(root.path())?;

    // The second pass observes the symlinks and mutates nothing
    let outcomes = merger.merge().await?;
    assert!(outcomes
        .iter()
        .all(|(_, outcome)| matches!(
            outcome,
            MergeOutcome::AlreadyMerged | MergeOutcome::Missing
        )));
    assert_eq!(helper::snapshot_tree(root.path())?, after_first);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_merge_copy_failure_leaves_legacy_directory() -> anyhow::Result<()> {
    let root = tempdir()?;
    helper::create_legacy_bin(root.path()).await?;

    // A regular file where the canonical directory should go makes the copy
    // fail, even when the tests run as root
    fs::create_dir(root.path().join("usr")).await?;
    fs::write(root.path().join("usr/bin"), "in the way").await?;

    let merger = UsrMerger::new(root.path(), None, false);
    let err = merger.merge().await.unwrap_err();
    assert!(matches!(err, UsrMergeError::CopyDirectory { .. }));

    // The legacy directory is untouched and no symlink was created
    let bin = root.path().join("bin");
    assert!(fs::symlink_metadata(&bin).await?.file_type().is_dir());
    assert_eq!(fs::read_to_string(bin.join("ls")).await?, "ls binary");
    assert_eq!(
        fs::read_to_string(root.path().join("usr/bin")).await?,
        "in the way"
    );

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_merge_removes_marker_scripts() -> anyhow::Result<()> {
    let root = tempdir()?;
    let info_dir = root.path().join("var/lib/dpkg/info");
    fs::create_dir_all(&info_dir).await?;
    fs::write(info_dir.join("usr-is-merged.preinst"), "#!/bin/sh\n").await?;
    fs::write(info_dir.join("usr-is-merged.postinst"), "#!/bin/sh\n").await?;
    fs::write(info_dir.join("base-files.preinst"), "#!/bin/sh\n").await?;

    let merger = UsrMerger::new(root.path(), None, true);
    merger.merge().await?;

    assert!(!info_dir.join("usr-is-merged.preinst").exists());
    assert!(!info_dir.join("usr-is-merged.postinst").exists());

    // Other maintainer scripts are left alone
    assert!(info_dir.join("base-files.preinst").exists());

    // A second run with the markers already gone is not an error
    merger.merge().await?;

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_merge_keeps_marker_scripts_without_cleanup() -> anyhow::Result<()> {
    let root = tempdir()?;
    let info_dir = root.path().join("var/lib/dpkg/info");
    fs::create_dir_all(&info_dir).await?;
    fs::write(info_dir.join("usr-is-merged.preinst"), "#!/bin/sh\n").await?;

    let merger = UsrMerger::new(root.path(), None, false);
    merger.merge().await?;

    assert!(info_dir.join("usr-is-merged.preinst").exists());

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_merge_mounted_rootfs_layout() -> anyhow::Result<()> {
    let scratch = tempdir()?;
    let mount_dir = scratch.path().join("rootfs");
    let target_root = scratch.path().join("target");
    fs::create_dir_all(&target_root).await?;
    helper::create_legacy_bin(&mount_dir).await?;

    let merger = UsrMerger::new(&target_root, Some(mount_dir.clone()), false);
    let outcomes = merger.merge().await?;
    assert_eq!(outcomes[0], ("/bin", MergeOutcome::Merged));

    // Contents land under the target root's /usr
    assert_eq!(
        fs::read_to_string(target_root.join("usr/bin/ls")).await?,
        "ls binary"
    );

    // The legacy directory is removed on the mount side
    assert!(fs::symlink_metadata(mount_dir.join("bin")).await.is_err());

    // The symlink is created under the target root with an unprefixed target
    let bin = target_root.join("bin");
    assert!(fs::symlink_metadata(&bin).await?.file_type().is_symlink());
    assert_eq!(fs::read_link(&bin).await?, PathBuf::from("/usr/bin"));

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Helpers
//--------------------------------------------------------------------------------------------------

mod helper {
    use std::{
        collections::BTreeMap,
        os::unix::fs::PermissionsExt,
        path::{Path, PathBuf},
    };

    use tokio::fs;
    use walkdir::WalkDir;

    /// Creates a legacy `/bin` fixture under the given root.
    ///
    /// ```text
    /// root/
    /// └── bin/
    ///     ├── ls         (rwxr-xr-x) "ls binary"
    ///     ├── sh       -> /bin/bash
    ///     ├── dangling -> missing-target
    ///     ├── loop     -> loop
    ///     └── commands/
    ///         ├── cat    "cat binary"
    ///         └── ls-alias -> ../ls
    /// ```
    pub(super) async fn create_legacy_bin(root: &Path) -> anyhow::Result<()> {
        let bin = root.join("bin");
        fs::create_dir_all(&bin).await?;

        let ls = bin.join("ls");
        fs::write(&ls, "ls binary").await?;
        fs::set_permissions(&ls, std::fs::Permissions::from_mode(0o755)).await?;

        let commands = bin.join("commands");
        fs::create_dir(&commands).await?;
        fs::write(commands.join("cat"), "cat binary").await?;

        std::os::unix::fs::symlink("/bin/bash", bin.join("sh"))?;
        std::os::unix::fs::symlink("../ls", commands.join("ls-alias"))?;
        std::os::unix::fs::symlink("missing-target", bin.join("dangling"))?;
        std::os::unix::fs::symlink("loop", bin.join("loop"))?;

        Ok(())
    }

    /// Walks a tree into a comparable map of relative path to entry
    /// description (type, contents, symlink target). Symlinks are never
    /// followed.
    pub(super) fn snapshot_tree(root: &Path) -> anyhow::Result<BTreeMap<PathBuf, String>> {
        let mut entries = BTreeMap::new();
        for entry in WalkDir::new(root) {
            let entry = entry?;
            let rel = entry.path().strip_prefix(root)?.to_path_buf();
            let file_type = entry.file_type();
            let description = if file_type.is_symlink() {
                format!("symlink -> {}", std::fs::read_link(entry.path())?.display())
            } else if file_type.is_dir() {
                "dir".to_string()
            } else {
                format!(
                    "file {}",
                    String::from_utf8_lossy(&std::fs::read(entry.path())?)
                )
            };
            entries.insert(rel, description);
        }
        Ok(entries)
    }
}
