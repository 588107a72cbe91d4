use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};

use crate::errors::StoreError;
use crate::market::listing::default_columns;
use crate::store::{Addressing, RawTable, RowAddress, RowStore};

/// Spreadsheet-like grid persisted as a JSON array of rows, header first.
///
/// Behaves like the sheets backend (positional, 1-based rows, header is row 1)
/// so the market can run locally without remote credentials.
pub struct JsonGridStore {
    inner: RwLock<Vec<Vec<String>>>,
    file_path: PathBuf,
}

impl JsonGridStore {
    /// Initialize the store from a path. Creates the file with just the header if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StoreError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let grid: Vec<Vec<String>> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Malformed(e.to_string()))?,
            Err(_) => {
                let fresh = vec![default_columns()];
                fs::write(&file_path, serde_json::to_vec(&fresh).map_err(|e| StoreError::Transport(e.to_string()))?)
                    .await
                    .map_err(|e| StoreError::Transport(e.to_string()))?;
                fresh
            }
        };

        Ok(Arc::new(Self { inner: RwLock::new(grid), file_path }))
    }

    async fn save(&self, grid: &[Vec<String>]) -> Result<(), StoreError> {
        let data = serde_json::to_vec(grid).map_err(|e| StoreError::Transport(e.to_string()))?;
        fs::write(&self.file_path, data).await.map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl RowStore for JsonGridStore {
    fn name(&self) -> &'static str { "local" }

    fn addressing(&self) -> Addressing { Addressing::Positional }

    async fn append(&self, fields: &[String; 3]) -> Result<(), StoreError> {
        let mut grid = self.inner.write().await;
        let mut next = grid.clone();
        if next.is_empty() {
            next.push(default_columns());
        }
        next.push(fields.to_vec());
        self.save(&next).await?;
        *grid = next;
        Ok(())
    }

    async fn fetch(&self) -> Result<RawTable, StoreError> {
        Ok(RawTable::Grid(self.inner.read().await.clone()))
    }

    async fn delete(&self, target: RowAddress) -> Result<(), StoreError> {
        let row = match target {
            RowAddress::RowNumber(n) => n,
            RowAddress::RecordId(id) => return Err(StoreError::Unsupported(format!("local grid has no record ids ({})", id))),
        };
        let mut grid = self.inner.write().await;
        // row 1 is the header
        if row < 2 || row > grid.len() {
            return Err(StoreError::NotFound(format!("row {}", row)));
        }
        let mut next = grid.clone();
        next.remove(row - 1);
        self.save(&next).await?;
        *grid = next;
        Ok(())
    }
}
