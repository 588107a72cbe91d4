use serde::{Deserialize, Serialize};

use crate::errors::MarketError;

/// Column headers used by every backend.
pub const ITEM_COLUMN: &str = "Item";
pub const PRICE_COLUMN: &str = "Price";
pub const SELLER_COLUMN: &str = "Seller";

pub fn default_columns() -> Vec<String> {
    vec![ITEM_COLUMN.to_string(), PRICE_COLUMN.to_string(), SELLER_COLUMN.to_string()]
}

/// One market row. Price is kept as text; nothing does arithmetic on it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Listing {
    pub item: String,
    pub price: String,
    pub seller: String,
}

impl Listing {
    /// Build a listing from raw form input.
    ///
    /// Stray `"` around each value are removed before the non-empty check, so
    /// `"\"Diamond\""` becomes `Diamond` and `"\"\""` is rejected.
    pub fn from_input(item: &str, price: &str, seller: &str) -> Result<Self, MarketError> {
        let listing = Self {
            item: clean_field(item),
            price: clean_field(price),
            seller: clean_field(seller),
        };
        listing.validate()?;
        Ok(listing)
    }

    pub fn validate(&self) -> Result<(), MarketError> {
        for (name, value) in [("item", &self.item), ("price", &self.price), ("seller", &self.seller)] {
            if value.is_empty() {
                return Err(MarketError::Validation(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Row values in column order.
    pub fn to_row(&self) -> [String; 3] {
        [self.item.clone(), self.price.clone(), self.seller.clone()]
    }

    /// Label shown in the delete selector.
    pub fn display_label(&self) -> String {
        format!("{} - {} coins - {}", self.item, self.price, self.seller)
    }
}

fn clean_field(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

/// Two-tier identity: a stable backend id when the store has one,
/// otherwise the zero-based position in the snapshot it was read from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ListingId {
    Native(String),
    Position(usize),
}

/// Handle captured at list time and handed back on delete.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingRef {
    pub id: ListingId,
    pub listing: Listing,
}
