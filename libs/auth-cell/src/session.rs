use std::sync::Arc;

use tracing::debug;

use shared_utils::token::token_preview;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const SESSION_TOKEN_KEY: &str = "authToken";

/// The single persisted-token slot.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub async fn persist(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(SESSION_TOKEN_KEY, token).await?;
        debug!("Stored session token {}", token_preview(token));
        Ok(())
    }

    pub async fn read(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(SESSION_TOKEN_KEY).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(SESSION_TOKEN_KEY).await
    }
}
