//! Row-oriented remote stores the market adapter talks to.
//!
//! A store either hands out stable record ids (`Addressing::Native`) or only
//! knows rows by their 1-based position in a sheet whose first row is the
//! header (`Addressing::Positional`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::StoreError;

pub mod airtable;
pub mod memory;
pub mod sheets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    Native,
    Positional,
}

/// Target of a delete in the backend's own addressing scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAddress {
    RecordId(String),
    /// 1-based sheet row; row 1 is the header.
    RowNumber(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub id: String,
    pub fields: HashMap<String, String>,
}

/// Everything a store returned from a full read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTable {
    Records(Vec<RawRecord>),
    /// Raw cell grid, header row first. Rows may be ragged.
    Grid(Vec<Vec<String>>),
}

#[async_trait]
pub trait RowStore: Send + Sync {
    fn name(&self) -> &'static str;
    fn addressing(&self) -> Addressing;
    /// Append one row given `[item, price, seller]`.
    async fn append(&self, fields: &[String; 3]) -> Result<(), StoreError>;
    async fn fetch(&self) -> Result<RawTable, StoreError>;
    async fn delete(&self, target: RowAddress) -> Result<(), StoreError>;
}

/// Build the store selected in configuration.
pub async fn from_config(cfg: &configs::StoreConfig) -> anyhow::Result<Arc<dyn RowStore>> {
    let store: Arc<dyn RowStore> = match cfg.backend {
        configs::Backend::Airtable => Arc::new(airtable::AirtableStore::new(&cfg.airtable)?),
        configs::Backend::Sheets => Arc::new(sheets::SheetsStore::new(&cfg.sheets)?),
        configs::Backend::Local => crate::storage::json_grid_store::JsonGridStore::new(&cfg.local.path).await?,
        configs::Backend::Memory => Arc::new(memory::MemoryStore::new(Addressing::Native)),
    };
    tracing::info!(backend = store.name(), "row store ready");
    Ok(store)
}

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?)
}

pub(crate) fn check_status(status: reqwest::StatusCode, body: &str) -> Result<(), StoreError> {
    if status.is_success() {
        return Ok(());
    }
    let msg = format!("{}: {}", status, body.chars().take(200).collect::<String>());
    Err(match status.as_u16() {
        401 | 403 => StoreError::Auth(msg),
        404 => StoreError::NotFound(msg),
        _ => StoreError::Transport(msg),
    })
}
