//! Service layer for the market.
//! - `market`: the adapter between the rendered market and the row store.
//! - `store`: remote row stores (hosted table API, spreadsheet API, in-memory).
//! - `storage`: local file-backed store for running without credentials.

pub mod errors;
pub mod market;
pub mod runtime;
pub mod storage;
pub mod store;
