use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Addressing, RawRecord, RawTable, RowAddress, RowStore};
use crate::errors::StoreError;
use crate::market::listing::default_columns;

/// In-memory store used for demos and tests.
///
/// In native mode rows get generated `rec…` ids; in positional mode the store
/// behaves like a sheet with a header row and 1-based row numbers.
pub struct MemoryStore {
    addressing: Addressing,
    inner: RwLock<Inner>,
    next_id: AtomicU64,
}

#[derive(Default)]
struct Inner {
    header: Vec<String>,
    rows: Vec<(String, Vec<String>)>,
    fail_next: Option<StoreError>,
    deletes: Vec<RowAddress>,
}

impl MemoryStore {
    pub fn new(addressing: Addressing) -> Self {
        Self {
            addressing,
            inner: RwLock::new(Inner { header: default_columns(), ..Default::default() }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Positional store seeded with a raw grid (header row first).
    pub fn with_grid(grid: Vec<Vec<String>>) -> Self {
        let mut store = Self::new(Addressing::Positional);
        let mut rows = grid.into_iter();
        let inner = store.inner.get_mut();
        inner.header = rows.next().unwrap_or_default();
        inner.rows = rows.map(|r| (String::new(), r)).collect();
        store
    }

    /// Make the next store call fail with `err`.
    pub async fn fail_next(&self, err: StoreError) {
        self.inner.write().await.fail_next = Some(err);
    }

    /// Every delete address received, oldest first.
    pub async fn deletes(&self) -> Vec<RowAddress> {
        self.inner.read().await.deletes.clone()
    }

    /// Remove a row behind the adapter's back, like another user would.
    pub async fn remove_external(&self, index: usize) {
        let mut g = self.inner.write().await;
        if index < g.rows.len() {
            g.rows.remove(index);
        }
    }

    fn take_failure(inner: &mut Inner) -> Result<(), StoreError> {
        match inner.fail_next.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    fn name(&self) -> &'static str { "memory" }

    fn addressing(&self) -> Addressing { self.addressing }

    async fn append(&self, fields: &[String; 3]) -> Result<(), StoreError> {
        let mut g = self.inner.write().await;
        Self::take_failure(&mut g)?;
        let id = format!("rec{:014}", self.next_id.fetch_add(1, Ordering::Relaxed));
        g.rows.push((id, fields.to_vec()));
        Ok(())
    }

    async fn fetch(&self) -> Result<RawTable, StoreError> {
        let mut g = self.inner.write().await;
        Self::take_failure(&mut g)?;
        Ok(match self.addressing {
            Addressing::Native => RawTable::Records(
                g.rows
                    .iter()
                    .map(|(id, row)| RawRecord {
                        id: id.clone(),
                        fields: g.header.iter().cloned().zip(row.iter().cloned()).collect::<HashMap<_, _>>(),
                    })
                    .collect(),
            ),
            Addressing::Positional => {
                let mut grid = Vec::with_capacity(g.rows.len() + 1);
                grid.push(g.header.clone());
                grid.extend(g.rows.iter().map(|(_, r)| r.clone()));
                RawTable::Grid(grid)
            }
        })
    }

    async fn delete(&self, target: RowAddress) -> Result<(), StoreError> {
        let mut g = self.inner.write().await;
        Self::take_failure(&mut g)?;
        g.deletes.push(target.clone());
        let index = match (&target, self.addressing) {
            (RowAddress::RecordId(id), Addressing::Native) => g
                .rows
                .iter()
                .position(|(rid, _)| rid == id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?,
            (RowAddress::RowNumber(n), Addressing::Positional) => {
                if *n < 2 || *n - 2 >= g.rows.len() {
                    return Err(StoreError::NotFound(format!("row {}", n)));
                }
                *n - 2
            }
            _ => return Err(StoreError::Unsupported(format!("{:?} on {:?} store", target, self.addressing))),
        };
        g.rows.remove(index);
        Ok(())
    }
}
