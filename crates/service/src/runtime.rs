//! Runtime environment helpers
//!
//! Startup wiring shared by binaries: directory checks and building the
//! market adapter for the configured backend.

use std::path::Path;

use crate::market::MarketAdapter;

/// Ensure the frontend dir exists (warn only) and create the local store's
/// data directory when the local backend is selected.
pub async fn ensure_env(cfg: &configs::AppConfig) -> anyhow::Result<()> {
    let data_dir = match cfg.store.backend {
        configs::Backend::Local => Path::new(&cfg.store.local.path)
            .parent()
            .and_then(|p| p.to_str())
            .filter(|p| !p.is_empty())
            .unwrap_or(".")
            .to_string(),
        _ => ".".to_string(),
    };
    common::env::ensure_env(&cfg.ui.frontend_dir, &data_dir).await
}

/// Build the adapter over the configured row store.
pub async fn build_adapter(cfg: &configs::AppConfig) -> anyhow::Result<MarketAdapter> {
    let store = crate::store::from_config(&cfg.store).await?;
    Ok(MarketAdapter::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_local_adapter_and_creates_data_dir() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("market_rt_{}", uuid::Uuid::new_v4()));
        let mut cfg = configs::AppConfig::default();
        cfg.store.backend = configs::Backend::Local;
        cfg.store.local.path = dir.join("market.json").to_string_lossy().into_owned();

        ensure_env(&cfg).await?;
        assert!(tokio::fs::metadata(&dir).await?.is_dir());

        let adapter = build_adapter(&cfg).await?;
        assert_eq!(adapter.backend(), "local");
        adapter.add_listing("Emerald", "3", "Alex").await?;
        assert_eq!(adapter.list_listings().await.len(), 1);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
