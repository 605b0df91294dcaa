use clap::Parser;

use super::styles;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Merges the legacy top-level directories of the running root into `/usr`.
///
/// The merge is fully determined by the compiled-in directory list; the
/// command takes no operational flags. Log verbosity is controlled with
/// `RUST_LOG`.
#[derive(Debug, Parser)]
#[command(name = "usrmerge", author, about, version, styles=styles::styles())]
pub struct UsrMergeArgs {}

/// Merges the legacy directories of an image mounted at `/rootfs` into `/usr`.
///
/// The merge is fully determined by the compiled-in directory list; the
/// command takes no operational flags. Log verbosity is controlled with
/// `RUST_LOG`.
#[derive(Debug, Parser)]
#[command(name = "usrmerge-rootfs", author, about, version, styles=styles::styles())]
pub struct UsrMergeRootfsArgs {}
