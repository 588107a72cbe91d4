use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{check_status, http_client, Addressing, RawTable, RowAddress, RowStore};
use crate::errors::StoreError;

/// Spreadsheet backend: rows are addressed by their 1-based sheet row number,
/// row 1 being the header.
pub struct SheetsStore {
    client: Client,
    spreadsheet_url: Url,
    sheet_name: String,
    sheet_id: i64,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl SheetsStore {
    pub fn new(cfg: &configs::SheetsConfig) -> anyhow::Result<Self> {
        let mut spreadsheet_url = Url::parse(&cfg.api_base)?;
        spreadsheet_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("sheets api_base cannot be a base url: {}", cfg.api_base))?
            .pop_if_empty()
            .push(&cfg.spreadsheet_id);
        Ok(Self {
            client: http_client()?,
            spreadsheet_url,
            sheet_name: cfg.sheet_name.clone(),
            sheet_id: cfg.sheet_id,
            access_token: cfg.access_token.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.spreadsheet_url.clone();
        if let Ok(mut segs) = url.path_segments_mut() {
            segs.extend(segments);
        }
        url
    }

    /// `spreadsheets/{id}:batchUpdate` hangs off the id segment itself.
    fn batch_update_url(&self) -> Url {
        let mut url = self.spreadsheet_url.clone();
        let last = url.path_segments().and_then(|mut s| s.next_back()).unwrap_or_default().to_string();
        if let Ok(mut segs) = url.path_segments_mut() {
            segs.pop().push(&format!("{}:batchUpdate", last));
        }
        url
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<String, StoreError> {
        let resp = req.bearer_auth(&self.access_token).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        check_status(status, &body)?;
        Ok(body)
    }
}

fn cell_text(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RowStore for SheetsStore {
    fn name(&self) -> &'static str { "sheets" }

    fn addressing(&self) -> Addressing { Addressing::Positional }

    #[instrument(skip(self, fields))]
    async fn append(&self, fields: &[String; 3]) -> Result<(), StoreError> {
        let range = format!("{}!A1:append", self.sheet_name);
        let req = self
            .client
            .post(self.url(&["values", &range]))
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [fields] }));
        self.send(req).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<RawTable, StoreError> {
        let body = self.send(self.client.get(self.url(&["values", &self.sheet_name]))).await?;
        let range: ValueRange = serde_json::from_str(&body).map_err(|e| StoreError::Malformed(e.to_string()))?;
        debug!(rows = range.values.len(), "sheet values read");
        let grid = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        Ok(RawTable::Grid(grid))
    }

    #[instrument(skip(self))]
    async fn delete(&self, target: RowAddress) -> Result<(), StoreError> {
        let row = match target {
            RowAddress::RowNumber(n) if n >= 2 => n,
            RowAddress::RowNumber(n) => {
                return Err(StoreError::Unsupported(format!("row {} is the header or out of range", n)))
            }
            RowAddress::RecordId(id) => {
                return Err(StoreError::Unsupported(format!("sheets has no record ids ({})", id)))
            }
        };
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": self.sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            }]
        });
        self.send(self.client.post(self.batch_update_url()).json(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use axum::{extract::{Path, State}, http::StatusCode, routing::{get, post}, Json, Router};
    use tokio::{net::TcpListener, sync::Mutex};

    type Seen = Arc<Mutex<Vec<(String, Value)>>>;

    async fn values(Path((_, range)): Path<(String, String)>) -> Json<Value> {
        assert_eq!(range, "Market");
        Json(json!({
            "range": "Market!A1:Z1000",
            "majorDimension": "ROWS",
            "values": [["Item", "Price", "Seller"], ["Diamond", 50], ["Iron", "5", "Alex"]]
        }))
    }

    async fn append(State(seen): State<Seen>, Path((_, range)): Path<(String, String)>, Json(body): Json<Value>) -> StatusCode {
        seen.lock().await.push((range, body));
        StatusCode::OK
    }

    async fn batch(State(seen): State<Seen>, Path(op): Path<String>, Json(body): Json<Value>) -> StatusCode {
        seen.lock().await.push((op, body));
        StatusCode::OK
    }

    async fn spawn_mock() -> anyhow::Result<(String, Seen)> {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/v4/spreadsheets/:id/values/:range", get(values).post(append))
            .route("/v4/spreadsheets/:op", post(batch))
            .with_state(seen.clone());
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok((format!("http://{}/v4/spreadsheets", addr), seen))
    }

    async fn spawn_garbage() -> anyhow::Result<String> {
        let app = Router::new().route("/v4/spreadsheets/:id/values/:range", get(|| async { "{\"values\": \"oops\"" }));
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{}/v4/spreadsheets", addr))
    }

    fn store(api_base: String) -> anyhow::Result<SheetsStore> {
        SheetsStore::new(&configs::SheetsConfig {
            spreadsheet_id: "sheet123".into(),
            sheet_name: "Market".into(),
            sheet_id: 7,
            access_token: "tok".into(),
            api_base,
        })
    }

    #[tokio::test]
    async fn fetch_returns_raw_grid() -> anyhow::Result<()> {
        let (base, _) = spawn_mock().await?;
        let RawTable::Grid(grid) = store(base)?.fetch().await? else { panic!("expected grid") };
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[1], vec!["Diamond".to_string(), "50".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_values_degrade_listing_to_warning() -> anyhow::Result<()> {
        let s = store(spawn_garbage().await?)?;
        assert!(matches!(s.fetch().await, Err(StoreError::Malformed(_))));

        let market = crate::market::MarketAdapter::new(Arc::new(s));
        let snap = market.list_listings().await;
        assert!(snap.is_empty());
        assert!(snap.warning.as_deref().is_some_and(|w| w.contains("malformed response")));
        Ok(())
    }

    #[tokio::test]
    async fn append_posts_single_row() -> anyhow::Result<()> {
        let (base, seen) = spawn_mock().await?;
        store(base)?.append(&["Gold".into(), "9".into(), "Steve".into()]).await?;
        let seen = seen.lock().await;
        assert_eq!(seen[0].0, "Market!A1:append");
        assert_eq!(seen[0].1["values"][0], json!(["Gold", "9", "Steve"]));
        Ok(())
    }

    #[tokio::test]
    async fn delete_row_number_maps_to_zero_based_dimension_range() -> anyhow::Result<()> {
        let (base, seen) = spawn_mock().await?;
        let s = store(base)?;
        s.delete(RowAddress::RowNumber(4)).await?;
        assert!(matches!(s.delete(RowAddress::RowNumber(1)).await, Err(StoreError::Unsupported(_))));
        let seen = seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "sheet123:batchUpdate");
        let range = &seen[0].1["requests"][0]["deleteDimension"]["range"];
        assert_eq!(range["sheetId"], 7);
        assert_eq!(range["startIndex"], 3);
        assert_eq!(range["endIndex"], 4);
        Ok(())
    }
}
