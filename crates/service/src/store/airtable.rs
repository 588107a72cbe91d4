use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{check_status, http_client, Addressing, RawRecord, RawTable, RowAddress, RowStore};
use crate::errors::StoreError;
use crate::market::listing::{ITEM_COLUMN, PRICE_COLUMN, SELLER_COLUMN};

/// Hosted table API with native record ids.
pub struct AirtableStore {
    client: Client,
    table_url: Url,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    records: Vec<RecordDto>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordDto {
    id: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl AirtableStore {
    pub fn new(cfg: &configs::AirtableConfig) -> anyhow::Result<Self> {
        let mut table_url = Url::parse(&cfg.api_base)?;
        table_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("airtable api_base cannot be a base url: {}", cfg.api_base))?
            .pop_if_empty()
            .push(&cfg.base_id)
            .push(&cfg.table_name);
        Ok(Self { client: http_client()?, table_url, token: cfg.token.clone() })
    }

    fn record_url(&self, id: &str) -> Url {
        let mut url = self.table_url.clone();
        if let Ok(mut segs) = url.path_segments_mut() {
            segs.push(id);
        }
        url
    }

    async fn read_body(resp: reqwest::Response) -> Result<String, StoreError> {
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
impl RowStore for AirtableStore {
    fn name(&self) -> &'static str { "airtable" }

    fn addressing(&self) -> Addressing { Addressing::Native }

    #[instrument(skip(self, fields))]
    async fn append(&self, fields: &[String; 3]) -> Result<(), StoreError> {
        let named: HashMap<&str, &String> = [ITEM_COLUMN, PRICE_COLUMN, SELLER_COLUMN]
            .into_iter()
            .zip(fields.iter())
            .collect();
        let body = json!({ "fields": named });
        let resp = self
            .client
            .post(self.table_url.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::read_body(resp).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<RawTable, StoreError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut req = self.client.get(self.table_url.clone()).bearer_auth(&self.token);
            if let Some(o) = &offset {
                req = req.query(&[("offset", o)]);
            }
            let body = Self::read_body(req.send().await?).await?;
            let page: ListPage = serde_json::from_str(&body).map_err(|e| StoreError::Malformed(e.to_string()))?;
            debug!(count = page.records.len(), has_more = page.offset.is_some(), "airtable page");
            records.extend(page.records.into_iter().map(|r| RawRecord {
                id: r.id,
                fields: r.fields.into_iter().map(|(k, v)| (k, cell_text(v))).collect(),
            }));
            match page.offset {
                Some(o) => offset = Some(o),
                None => break,
            }
        }
        Ok(RawTable::Records(records))
    }

    #[instrument(skip(self))]
    async fn delete(&self, target: RowAddress) -> Result<(), StoreError> {
        let id = match target {
            RowAddress::RecordId(id) => id,
            RowAddress::RowNumber(n) => {
                return Err(StoreError::Unsupported(format!("airtable cannot delete by row number {}", n)))
            }
        };
        let resp = self.client.delete(self.record_url(&id)).bearer_auth(&self.token).send().await?;
        Self::read_body(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        routing::{delete, get},
        Json, Router,
    };
    use tokio::net::TcpListener;

    async fn list(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer tok") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(Json(match q.get("offset").map(String::as_str) {
            None => json!({
                "records": [{"id": "rec1", "createdTime": "2024-01-01T00:00:00.000Z", "fields": {"Item": "Diamond", "Price": 50, "Seller": "Steve"}}],
                "offset": "page2"
            }),
            Some(_) => json!({
                "records": [{"id": "rec2", "fields": {"Item": "Iron", "Price": "5"}}]
            }),
        }))
    }

    async fn remove(Path((_, _, id)): Path<(String, String, String)>) -> StatusCode {
        if id == "rec1" { StatusCode::OK } else { StatusCode::NOT_FOUND }
    }

    async fn spawn_mock() -> anyhow::Result<String> {
        let app = Router::new()
            .route("/v0/:base/:table", get(list))
            .route("/v0/:base/:table/:id", delete(remove));
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{}/v0", addr))
    }

    async fn spawn_garbage() -> anyhow::Result<String> {
        let app = Router::new().route("/v0/:base/:table", get(|| async { "<html>maintenance</html>" }));
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{}/v0", addr))
    }

    fn cfg(api_base: String, token: &str) -> configs::AirtableConfig {
        configs::AirtableConfig {
            token: token.into(),
            base_id: "appBase".into(),
            table_name: "Market Items".into(),
            api_base,
        }
    }

    #[tokio::test]
    async fn fetch_follows_offset_and_stringifies_cells() -> anyhow::Result<()> {
        let base = spawn_mock().await?;
        let store = AirtableStore::new(&cfg(base, "tok"))?;
        let RawTable::Records(records) = store.fetch().await? else { panic!("expected records") };
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "rec1");
        assert_eq!(records[0].fields["Price"], "50");
        assert_eq!(records[1].fields.get("Seller"), None);
        Ok(())
    }

    #[tokio::test]
    async fn bad_token_is_auth_error() -> anyhow::Result<()> {
        let base = spawn_mock().await?;
        let store = AirtableStore::new(&cfg(base, "wrong"))?;
        assert!(matches!(store.fetch().await, Err(StoreError::Auth(_))));
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_body_degrades_listing_to_warning() -> anyhow::Result<()> {
        let base = spawn_garbage().await?;
        let store = AirtableStore::new(&cfg(base, "tok"))?;
        assert!(matches!(store.fetch().await, Err(StoreError::Malformed(_))));

        let market = crate::market::MarketAdapter::new(std::sync::Arc::new(store));
        let snap = market.list_listings().await;
        assert!(snap.is_empty());
        assert!(snap.warning.as_deref().is_some_and(|w| w.contains("malformed response")));
        Ok(())
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() -> anyhow::Result<()> {
        let base = spawn_mock().await?;
        let store = AirtableStore::new(&cfg(base, "tok"))?;
        store.delete(RowAddress::RecordId("rec1".into())).await?;
        assert!(matches!(store.delete(RowAddress::RecordId("rec9".into())).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(RowAddress::RowNumber(2)).await, Err(StoreError::Unsupported(_))));
        Ok(())
    }
}
