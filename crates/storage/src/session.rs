//! Remote session tier for per-user checkout URLs.
//!
//! The backend exposes a per-user key-value session API; this trait keeps it
//! an opaque collaborator so the link store can be exercised without a
//! network.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;

/// Per-user remote key-value store for checkout URLs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the checkout URL for a user, optionally scoped to one plan.
    async fn save_url(
        &self,
        user_id: &str,
        plan_id: Option<&str>,
        url: &str,
    ) -> Result<(), StorageError>;

    /// Fetch the checkout URL for a user, optionally scoped to one plan.
    async fn get_url(
        &self,
        user_id: &str,
        plan_id: Option<&str>,
    ) -> Result<Option<String>, StorageError>;
}

/// In-process session store backed by a map.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_key(user_id: &str, plan_id: Option<&str>) -> String {
        match plan_id {
            Some(plan_id) => format!("{user_id}/checkout_url:{plan_id}"),
            None => format!("{user_id}/checkout_url"),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save_url(
        &self,
        user_id: &str,
        plan_id: Option<&str>,
        url: &str,
    ) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        entries.insert(Self::entry_key(user_id, plan_id), url.to_string());
        Ok(())
    }

    async fn get_url(
        &self,
        user_id: &str,
        plan_id: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&Self::entry_key(user_id, plan_id)).cloned())
    }
}
