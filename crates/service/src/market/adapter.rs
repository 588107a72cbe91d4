use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use super::listing::{Listing, ListingId, ListingRef};
use super::snapshot::MarketSnapshot;
use crate::errors::{MarketError, StoreError};
use crate::store::{Addressing, RowAddress, RowStore};

/// Sheet rows are 1-based and row 1 holds the header.
const HEADER_ROW_OFFSET: usize = 2;

/// Native row number of the entry at zero-based snapshot position `index`.
pub fn sheet_row_for(index: usize) -> usize { index + HEADER_ROW_OFFSET }

/// A completed change to the market. The caller should re-read and redraw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Added(Listing),
    Deleted(Listing),
}

impl Mutation {
    pub fn needs_refresh(&self) -> bool { true }

    pub fn listing(&self) -> &Listing {
        match self {
            Self::Added(l) | Self::Deleted(l) => l,
        }
    }
}

/// Keeps the locally rendered market and the remote row store in step.
#[derive(Clone)]
pub struct MarketAdapter {
    store: Arc<dyn RowStore>,
}

impl MarketAdapter {
    pub fn new(store: Arc<dyn RowStore>) -> Self { Self { store } }

    pub fn backend(&self) -> &'static str { self.store.name() }

    pub fn addressing(&self) -> Addressing { self.store.addressing() }

    #[instrument(skip(self), fields(backend = self.store.name()))]
    pub async fn add_listing(&self, item: &str, price: &str, seller: &str) -> Result<Mutation, MarketError> {
        let listing = Listing::from_input(item, price, seller)?;
        self.store.append(&listing.to_row()).await.map_err(|e| {
            error!(error = %e, "append failed");
            MarketError::from(e)
        })?;
        info!(item = %listing.item, price = %listing.price, seller = %listing.seller, "listing added");
        Ok(Mutation::Added(listing))
    }

    /// Full read of the market. Never fails: an unreadable store gives an
    /// empty snapshot carrying a warning.
    #[instrument(skip(self), fields(backend = self.store.name()))]
    pub async fn list_listings(&self) -> MarketSnapshot {
        match self.store.fetch().await {
            Ok(raw) => {
                let snapshot = MarketSnapshot::from_raw(raw);
                info!(count = snapshot.len(), "market read");
                snapshot
            }
            Err(e) => {
                warn!(error = %e, "market read failed; showing empty market");
                MarketSnapshot::degraded(format!("Error accessing the market store: {}", e))
            }
        }
    }

    #[instrument(skip(self, target), fields(backend = self.store.name(), id = ?target.id))]
    pub async fn delete_listing(&self, target: &ListingRef) -> Result<Mutation, MarketError> {
        let address = match &target.id {
            ListingId::Native(id) => RowAddress::RecordId(id.clone()),
            ListingId::Position(hint) => self.resolve_position(&target.listing, *hint).await?,
        };
        self.store.delete(address).await.map_err(|e| {
            error!(error = %e, "delete failed");
            match e {
                StoreError::NotFound(_) => MarketError::not_found(&target.listing.display_label()),
                other => MarketError::from(other),
            }
        })?;
        info!(item = %target.listing.item, seller = %target.listing.seller, "listing deleted");
        Ok(Mutation::Deleted(target.listing.clone()))
    }

    /// Re-resolve a positional handle against a fresh read so that rows added
    /// or removed since the page was rendered cannot shift the target.
    async fn resolve_position(&self, listing: &Listing, hint: usize) -> Result<RowAddress, MarketError> {
        let raw = self.store.fetch().await.map_err(|e| {
            error!(error = %e, "fresh read before delete failed");
            MarketError::from(e)
        })?;
        let fresh = MarketSnapshot::from_raw(raw);
        let index = fresh.resolve(listing, Some(hint)).ok_or_else(|| {
            warn!(hint, label = %listing.display_label(), "selected listing no longer present");
            MarketError::not_found(&listing.display_label())
        })?;
        if index != hint {
            info!(hint, index, "listing moved since it was displayed");
        }
        Ok(RowAddress::RowNumber(sheet_row_for(index)))
    }
}
