//! `usrmerge::error` is a module containing error utilities for the usrmerge project.

use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a usrmerge-related operation.
pub type UsrMergeResult<T> = Result<T, UsrMergeError>;

/// An error that occurred while merging legacy directories into `/usr`.
#[derive(pretty_error_debug::Debug, Error)]
pub enum UsrMergeError {
    /// An error that occurred when performing an IO operation
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Copying a legacy directory into its canonical `/usr` location failed.
    #[error("failed to copy {legacy} into {canonical}: {source}")]
    CopyDirectory {
        /// The legacy directory being copied.
        legacy: String,

        /// The canonical destination directory.
        canonical: String,

        /// The underlying IO error.
        source: io::Error,
    },

    /// Removing a legacy directory after its contents were copied failed.
    #[error("failed to remove {legacy}: {source}")]
    RemoveDirectory {
        /// The legacy directory being removed.
        legacy: String,

        /// The underlying IO error.
        source: io::Error,
    },

    /// Replacing a legacy directory with its `/usr` symlink failed.
    #[error("failed to symlink {legacy} -> {canonical}: {source}")]
    SymlinkDirectory {
        /// The location of the symlink.
        legacy: String,

        /// The canonical directory the symlink points to.
        canonical: String,

        /// The underlying IO error.
        source: io::Error,
    },

    /// Custom error.
    #[error("Custom error: {0}")]
    Custom(#[from] AnyError),
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl UsrMergeError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> UsrMergeError {
        UsrMergeError::Custom(AnyError {
            error: error.into(),
        })
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `UsrMergeResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> UsrMergeResult<T> {
    Result::Ok(value)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}
