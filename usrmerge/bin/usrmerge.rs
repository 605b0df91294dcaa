//! `usrmerge` converts the currently running root filesystem to the
//! merged-`/usr` layout.
//!
//! # Overview
//!
//! The legacy top-level directories (`/bin`, `/lib`, `/lib32`, `/lib64`,
//! `/libo32`, `/libx32`, `/sbin`) are merged into their counterparts under
//! `/usr` and replaced with symlinks. Directories that are missing or have
//! already been merged are skipped, so the command can be re-run safely.
//! The obsolete `usr-is-merged` maintainer scripts are removed once all
//! directories are processed.
//!
//! The first failing filesystem operation aborts the run with exit status 1;
//! directories merged before the failure stay merged, and re-running after
//! fixing the underlying problem completes the transition.
//!
//! ## Usage
//!
//! ```bash
//! usrmerge
//! ```
//!
//! The command takes no arguments. Log verbosity is controlled with
//! `RUST_LOG`, e.g. `RUST_LOG=debug usrmerge`.

use std::process;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use usrmerge::{
    cli::UsrMergeArgs,
    merge::{MergeOutcome, UsrMerger},
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
    UsrMergeArgs::parse();

    let merger = UsrMerger::live_root();

    tracing::info!("merging the running root filesystem");
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
