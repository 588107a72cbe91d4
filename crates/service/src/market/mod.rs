//! Market store adapter.
//!
//! Maps the remote row store onto an ordered list of listings and resolves the
//! identity a user picked on screen back to a row the store can delete.

pub mod adapter;
pub mod listing;
pub mod snapshot;

pub use adapter::{MarketAdapter, Mutation};
pub use listing::{Listing, ListingId, ListingRef};
pub use snapshot::MarketSnapshot;
