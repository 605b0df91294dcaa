//! `usrmerge` converts a Debian root filesystem to the merged-`/usr` layout.
//!
//! # Overview
//!
//! Debian's usr-merge transition consolidates the legacy top-level
//! directories (`/bin`, `/lib`, `/lib32`, `/lib64`, `/libo32`, `/libx32`,
//! `/sbin`) into their canonical counterparts under `/usr`, replacing each
//! with a symlink:
//!
//! ```text
//! /bin  -> /usr/bin
//! /lib  -> /usr/lib
//! /sbin -> /usr/sbin
//! ```
//!
//! The merge is idempotent: directories that are missing or already replaced
//! by a symlink are skipped, so the operation can be re-run safely after a
//! failed attempt. Symlinks inside a merged tree are recreated shallowly
//! with their original target strings, never followed.
//!
//! Two fixed-function binaries drive the library:
//!
//! - `usrmerge` merges the currently running root and afterwards removes the
//!   obsolete `usr-is-merged` maintainer scripts.
//! - `usrmerge-rootfs` merges a root filesystem image mounted at `/rootfs`.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument parsing for the binaries
//! - [`merge`] - The merge operation and the recursive tree copy behind it
//! - [`utils`] - Path constants and helpers

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod cli;
pub mod merge;
pub mod utils;

pub use error::*;
