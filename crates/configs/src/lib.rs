use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Seconds between automatic page reloads; 0 disables.
    #[serde(default)]
    pub refresh_secs: u64,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { title: default_title(), refresh_secs: 0, frontend_dir: default_frontend_dir() }
    }
}

fn default_title() -> String { "Minecraft Market".into() }
fn default_frontend_dir() -> String { "frontend".into() }

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Airtable,
    Sheets,
    Local,
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "airtable" => Ok(Self::Airtable),
            "sheets" => Ok(Self::Sheets),
            "local" => Ok(Self::Local),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub airtable: AirtableConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub local: LocalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirtableConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub base_id: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default = "default_airtable_api")]
    pub api_base: String,
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self { token: String::new(), base_id: String::new(), table_name: String::new(), api_base: default_airtable_api() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Numeric tab id (`gid`), needed for row deletion.
    #[serde(default)]
    pub sheet_id: i64,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_sheets_api")]
    pub api_base: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: default_sheet_name(),
            sheet_id: 0,
            access_token: String::new(),
            api_base: default_sheets_api(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_local_path")]
    pub path: String,
}

impl Default for LocalConfig {
    fn default() -> Self { Self { path: default_local_path() } }
}

fn default_airtable_api() -> String { "https://api.airtable.com/v0".into() }
fn default_sheets_api() -> String { "https://sheets.googleapis.com/v4/spreadsheets".into() }
fn default_sheet_name() -> String { "Sheet1".into() }
fn default_local_path() -> String { "data/market.json".into() }

/// Read `CONFIG_PATH` (default `config.toml`), or the environment when that file does not exist.
pub fn load_or_env() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_or_env_from(&path)
}

/// Only a missing file falls back to [`from_env`]; unreadable or invalid files are errors.
pub fn load_or_env_from(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).map_err(|e| anyhow!("invalid config file {}: {}", path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(from_env()),
        Err(e) => Err(anyhow!("cannot read config file {}: {}", path, e)),
    }
}

/// Environment-only configuration, used when no config file is present.
pub fn from_env() -> AppConfig {
    let mut cfg = AppConfig::default();
    if let Ok(host) = std::env::var("SERVER_HOST") {
        cfg.server.host = host;
    }
    if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        cfg.server.port = port;
    }
    cfg
}

fn env_or(slot: &mut String, key: &str) {
    if slot.trim().is_empty() {
        if let Ok(v) = std::env::var(key) {
            *slot = v;
        }
    }
}

fn require(value: &str, name: &str, env_key: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{} is empty; set it in config.toml or the {} environment variable", name, env_key));
    }
    Ok(())
}

impl AppConfig {
    /// [`load_or_env`], then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_or_env()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.normalize_from_env()?;
        self.store.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl StoreConfig {
    /// Fill empty secrets from the environment and honor `MARKET_BACKEND`.
    pub fn normalize_from_env(&mut self) -> Result<()> {
        if let Ok(b) = std::env::var("MARKET_BACKEND") {
            self.backend = b.parse()?;
        }
        env_or(&mut self.airtable.token, "AIRTABLE_TOKEN");
        env_or(&mut self.airtable.base_id, "AIRTABLE_BASE_ID");
        env_or(&mut self.airtable.table_name, "AIRTABLE_TABLE_NAME");
        env_or(&mut self.sheets.spreadsheet_id, "SHEETS_SPREADSHEET_ID");
        env_or(&mut self.sheets.access_token, "SHEETS_ACCESS_TOKEN");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        match self.backend {
            Backend::Airtable => {
                require(&self.airtable.token, "store.airtable.token", "AIRTABLE_TOKEN")?;
                require(&self.airtable.base_id, "store.airtable.base_id", "AIRTABLE_BASE_ID")?;
                require(&self.airtable.table_name, "store.airtable.table_name", "AIRTABLE_TABLE_NAME")?;
            }
            Backend::Sheets => {
                require(&self.sheets.spreadsheet_id, "store.sheets.spreadsheet_id", "SHEETS_SPREADSHEET_ID")?;
                require(&self.sheets.access_token, "store.sheets.access_token", "SHEETS_ACCESS_TOKEN")?;
                if self.sheets.sheet_name.trim().is_empty() {
                    return Err(anyhow!("store.sheets.sheet_name must not be empty"));
                }
            }
            Backend::Local => {
                if self.local.path.trim().is_empty() {
                    return Err(anyhow!("store.local.path must not be empty"));
                }
            }
            Backend::Memory => {}
        }
        Ok(())
    }
}
