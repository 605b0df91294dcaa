//! `usrmerge-rootfs` converts a root filesystem image mounted at `/rootfs`
//! to the merged-`/usr` layout.
//!
//! # Overview
//!
//! The legacy top-level directories (`/bin`, `/lib`, `/lib32`, `/lib64`,
//! `/libo32`, `/libx32`, `/sbin`) are read from under the `/rootfs` mount,
//! merged into the counterparts under `/usr`, and removed; each legacy path
//! is then replaced with a symlink whose target is the plain canonical path
//! (for example `/bin -> /usr/bin`), so the links are correct once the image
//! boots. Directories that are missing or have already been merged are
//! skipped, so the command can be re-run safely.
//!
//! The first failing filesystem operation aborts the run with exit status 1;
//! directories merged before the failure stay merged, and re-running after
//! fixing the underlying problem completes the transition.
//!
//! ## Usage
//!
//! ```bash
//! usrmerge-rootfs
//! ```
//!
//! The command takes no arguments and expects the image to already be
//! mounted at `/rootfs`. Log verbosity is controlled with `RUST_LOG`.

use std::process;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use usrmerge::{
    cli::UsrMergeRootfsArgs,
    merge::{MergeOutcome, UsrMerger},
    utils::ROOTFS_MOUNT_DIR,
};

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing subscriber with EnvFilter, defaulting to info so
    // the per-directory decisions are visible without RUST_LOG set
    fmt()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    UsrMergeRootfsArgs::parse();

    let merger = UsrMerger::mounted_rootfs();

    tracing::info!(
        "merging the root filesystem image mounted at {}",
        ROOTFS_MOUNT_DIR
    );
    match merger.merge().await {
        Ok(outcomes) => {
            let merged = outcomes
                .iter()
                .filter(|(_, outcome)| *outcome == MergeOutcome::Merged)
                .count();
            tracing::info!("usr merge complete: {} directories merged", merged);
        }
        Err(e) => {
            tracing::error!("usr merge failed: {}", e);
            process::exit(1);
        }
    }
}
