//! Merging of legacy top-level directories into `/usr`.

mod copy;
mod merger;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use copy::*;
pub use merger::*;
