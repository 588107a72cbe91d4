use std::sync::Arc;

use service::market::MarketAdapter;

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub market: MarketAdapter,
    pub ui: Arc<configs::UiConfig>,
}

impl ServerState {
    pub fn new(market: MarketAdapter, ui: configs::UiConfig) -> Self {
        Self { market, ui: Arc::new(ui) }
    }
}
