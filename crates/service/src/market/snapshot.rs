use serde::{Deserialize, Serialize};

use super::listing::{default_columns, Listing, ListingId, ListingRef, ITEM_COLUMN, PRICE_COLUMN, SELLER_COLUMN};
use crate::store::{RawRecord, RawTable};

/// Point-in-time read of the whole market, in store order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketSnapshot {
    /// Names of the projected columns, in the order each entry is laid out.
    pub columns: Vec<String>,
    pub entries: Vec<ListingRef>,
    /// Set when the read failed and the snapshot was degraded to empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl MarketSnapshot {
    pub fn empty() -> Self {
        Self { columns: default_columns(), entries: Vec::new(), warning: None }
    }

    pub fn degraded(warning: impl Into<String>) -> Self {
        Self { warning: Some(warning.into()), ..Self::empty() }
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn listings(&self) -> impl Iterator<Item = &Listing> {
        self.entries.iter().map(|e| &e.listing)
    }

    /// Position of the entry holding `listing`, preferring `hint` when it
    /// still matches. Among identical rows the first one wins otherwise.
    pub fn resolve(&self, listing: &Listing, hint: Option<usize>) -> Option<usize> {
        if let Some(i) = hint {
            if self.entries.get(i).is_some_and(|e| &e.listing == listing) {
                return Some(i);
            }
        }
        self.entries.iter().position(|e| &e.listing == listing)
    }

    pub fn from_raw(raw: RawTable) -> Self {
        match raw {
            RawTable::Records(records) => Self::from_records(records),
            RawTable::Grid(grid) => Self::from_grid(grid),
        }
    }

    fn from_records(records: Vec<RawRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|mut r| {
                let mut take = |col: &str| r.fields.remove(col).unwrap_or_default();
                let listing = Listing { item: take(ITEM_COLUMN), price: take(PRICE_COLUMN), seller: take(SELLER_COLUMN) };
                ListingRef { id: ListingId::Native(r.id), listing }
            })
            .collect();
        Self { columns: default_columns(), entries, warning: None }
    }

    /// First row is the header. Data rows are padded with empty cells or
    /// truncated to the header width before the market columns are picked.
    fn from_grid(grid: Vec<Vec<String>>) -> Self {
        let mut rows = grid.into_iter();
        let header: Vec<String> = match rows.next() {
            Some(h) if !h.iter().all(|c| c.trim().is_empty()) => h,
            _ => return Self::empty(),
        };
        let width = header.len();
        let locate = |name: &str, fallback: usize| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .unwrap_or(fallback)
        };
        let cols = [locate(ITEM_COLUMN, 0), locate(PRICE_COLUMN, 1), locate(SELLER_COLUMN, 2)];

        let entries = rows
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .enumerate()
            .map(|(i, row)| {
                let cell = |c: usize| row.get(c).cloned().unwrap_or_default();
                ListingRef {
                    id: ListingId::Position(i),
                    listing: Listing { item: cell(cols[0]), price: cell(cols[1]), seller: cell(cols[2]) },
                }
            })
            .collect();
        Self { columns: default_columns(), entries, warning: None }
    }
}
