//! Persisted credential slot.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential store is corrupt: {0}")]
    Corrupt(String),
}

/// Process-wide slot holding the raw credential payload.
///
/// Only the bootstrap flow writes it; everything else reads after startup.
pub trait CredentialSlot: Send + Sync {
    fn load(&self) -> Result<Option<Value>, StoreError>;

    fn save(&self, payload: &Value) -> Result<(), StoreError>;
}
