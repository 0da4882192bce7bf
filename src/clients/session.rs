//! HTTP implementation of the remote session tier.
//!
//! The backend keeps a small per-user key-value session namespace; checkout
//! URLs live there under a fixed key, plan-scoped when a plan id is known.
//! All failures are reported as [`StorageError::Session`] so the link store
//! can recover via the local cache.

use async_trait::async_trait;
use mealsmith_storage::{SessionStore, StorageError};
use serde_json::{json, Value};

pub struct HttpSessionStore {
    http: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl HttpSessionStore {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            auth_token: auth_token.into(),
        }
    }

    fn session_key(plan_id: Option<&str>) -> String {
        match plan_id {
            Some(plan_id) => format!("checkout_url:{plan_id}"),
            None => "checkout_url".to_string(),
        }
    }

    fn endpoint(&self, user_id: &str, key: &str) -> String {
        format!("{}/api/users/{}/session/{}", self.base_url, user_id, key)
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn save_url(
        &self,
        user_id: &str,
        plan_id: Option<&str>,
        url: &str,
    ) -> Result<(), StorageError> {
        let key = Self::session_key(plan_id);
        let mut req = self
            .http
            .put(self.endpoint(user_id, &key))
            .json(&json!({ "value": url }));
        if !self.auth_token.is_empty() {
            req = req.bearer_auth(&self.auth_token);
        }

        req.send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StorageError::Session(e.to_string()))?;
        Ok(())
    }

    async fn get_url(
        &self,
        user_id: &str,
        plan_id: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let key = Self::session_key(plan_id);
        let mut req = self.http.get(self.endpoint(user_id, &key));
        if !self.auth_token.is_empty() {
            req = req.bearer_auth(&self.auth_token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StorageError::Session(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let payload = response
            .error_for_status()
            .map_err(|e| StorageError::Session(e.to_string()))?
            .json::<Value>()
            .await
            .map_err(|e| StorageError::Session(e.to_string()))?;

        Ok(payload
            .get("value")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }
}
