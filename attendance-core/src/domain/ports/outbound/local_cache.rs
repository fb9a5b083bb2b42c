use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Outbound port for the local key-value mirror.
///
/// Reads and writes are synchronous. The cache only ever holds a copy of state
/// whose authority is the remote store, so callers treat write failures as
/// non-fatal.
pub trait LocalCache: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> Result<(), CacheError>;

    fn remove(&self, key: &str) -> Result<(), CacheError>;
}
