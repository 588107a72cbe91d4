use thiserror::Error;

/// Failure reported by a `RowStore` backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::Transport(_) => StoreErrorKind::Transport,
            Self::Auth(_) => StoreErrorKind::Auth,
            Self::NotFound(_) => StoreErrorKind::NotFound,
            Self::Malformed(_) => StoreErrorKind::Malformed,
            Self::Unsupported(_) => StoreErrorKind::Unsupported,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    Transport,
    Auth,
    NotFound,
    Malformed,
    Unsupported,
}

/// Outcome of a failed market operation, as seen by the UI layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store error: {message}")]
    Store { kind: StoreErrorKind, message: String },
}

impl MarketError {
    pub fn not_found(what: &str) -> Self { Self::NotFound(format!("{} is no longer in the market", what)) }
}

impl From<StoreError> for MarketError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Store { kind: other.kind(), message: other.to_string() },
        }
    }
}
