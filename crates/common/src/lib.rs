//! Shared helpers for the market binaries: logging bootstrap, startup
//! directory checks, and small wire types.

pub mod env;
pub mod types;
pub mod utils;
