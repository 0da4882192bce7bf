//! On-device cache tier: a SQLite key-value table that survives restarts and
//! absorbs remote-store outages.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::error::StorageError;

/// Key for the most recently created checkout URL, regardless of plan.
pub const CHECKOUT_URL_KEY: &str = "checkout_url";

/// Key for the categorized shopping list of the last accepted plan.
pub const SHOPPING_LIST_KEY: &str = "shopping_list";

/// Key for the locally saved plan library.
pub const SAVED_PLANS_KEY: &str = "saved_meal_plans";

/// Plan-scoped variant of [`CHECKOUT_URL_KEY`].
pub fn checkout_url_plan_key(plan_id: &str) -> String {
    format!("{CHECKOUT_URL_KEY}:{plan_id}")
}

/// SQLite-backed key-value store, the local tier of the link store.
#[derive(Debug, Clone)]
pub struct LocalCache {
    pool: SqlitePool,
}

impl LocalCache {
    /// Open (creating if missing) the cache database at `database_url`.
    pub async fn open(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(sqlx::Error::from)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        let cache = Self { pool };
        cache.init().await?;
        Ok(cache)
    }

    /// In-memory cache for tests. Capped to one connection so every query
    /// sees the same :memory: database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let cache = Self { pool };
        cache.init().await?;
        Ok(cache)
    }

    async fn init(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS device_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM device_cache WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("value")))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO device_cache (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM device_cache WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_overwrite_remove() {
        let cache = LocalCache::in_memory().await.unwrap();

        assert_eq!(cache.get("missing").await.unwrap(), None);

        cache.set("k", "v1").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v1".to_string()));

        cache.set("k", "v2").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v2".to_string()));

        cache.remove("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[test]
    fn plan_key_includes_plan_id() {
        assert_eq!(checkout_url_plan_key("plan-7"), "checkout_url:plan-7");
    }
}
