//! Storage abstractions for service layer
//!
//! File-backed stores used when the market runs without a remote backend.

pub mod json_grid_store;
