//! Two-tier persistence for checkout URLs, shopping lists, and saved plans.
//!
//! The remote session store is the primary tier; the local cache is always
//! written as well, so a URL created in one session can be reopened even if
//! the backend was unreachable when it was saved.

use chrono::{DateTime, Utc};
use mealsmith_mealplan::MealPlan;
use mealsmith_shopping::ShoppingList;
use serde::{Deserialize, Serialize};

use crate::cache::{checkout_url_plan_key, LocalCache, CHECKOUT_URL_KEY, SAVED_PLANS_KEY, SHOPPING_LIST_KEY};
use crate::error::StorageError;
use crate::session::SessionStore;

/// How many plans the local library keeps, newest first.
const SAVED_PLANS_LIMIT: usize = 20;

/// A plan kept in the local library when the backend save failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlan {
    #[serde(flatten)]
    pub plan: MealPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Two-tier store: remote session first, local cache always.
pub struct CheckoutLinkStore<S: SessionStore> {
    session: S,
    cache: LocalCache,
    user_id: String,
}

impl<S: SessionStore> CheckoutLinkStore<S> {
    pub fn new(session: S, cache: LocalCache, user_id: impl Into<String>) -> Self {
        Self {
            session,
            cache,
            user_id: user_id.into(),
        }
    }

    /// Save a checkout URL. The remote tier may fail; the local tier must
    /// not, and both the plan-scoped key and the most-recent key are written
    /// so the URL is recoverable with or without a plan id.
    pub async fn save_url_for_plan(
        &self,
        plan_id: Option<&str>,
        url: &str,
    ) -> Result<(), StorageError> {
        if let Err(err) = self.session.save_url(&self.user_id, plan_id, url).await {
            tracing::warn!(error = %err, "session store save failed, keeping local copy only");
        }

        if let Some(plan_id) = plan_id {
            self.cache.set(&checkout_url_plan_key(plan_id), url).await?;
        }
        self.cache.set(CHECKOUT_URL_KEY, url).await?;
        Ok(())
    }

    /// Load a checkout URL: remote tier, then the local plan-scoped key,
    /// then the local most-recent key.
    pub async fn load_url_for_plan(
        &self,
        plan_id: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        match self.session.get_url(&self.user_id, plan_id).await {
            Ok(Some(url)) => return Ok(Some(url)),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "session store read failed, falling back to local cache");
            }
        }

        if let Some(plan_id) = plan_id {
            if let Some(url) = self.cache.get(&checkout_url_plan_key(plan_id)).await? {
                return Ok(Some(url));
            }
        }
        self.cache.get(CHECKOUT_URL_KEY).await
    }

    /// Cache the shopping list of the last accepted plan. Local tier only;
    /// the backend has no list endpoint.
    pub async fn save_shopping_list(&self, list: &ShoppingList) -> Result<(), StorageError> {
        let json = serde_json::to_string(list)?;
        self.cache.set(SHOPPING_LIST_KEY, &json).await
    }

    pub async fn load_shopping_list(&self) -> Result<Option<ShoppingList>, StorageError> {
        match self.cache.get(SHOPPING_LIST_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Prepend a plan to the local library, keeping the newest
    /// [`SAVED_PLANS_LIMIT`] entries.
    pub async fn save_plan_locally(
        &self,
        plan: &MealPlan,
        checkout_url: Option<&str>,
    ) -> Result<(), StorageError> {
        let mut plans = self.saved_plans().await?;
        plans.insert(
            0,
            SavedPlan {
                plan: plan.clone(),
                checkout_url: checkout_url.map(str::to_string),
                saved_at: Utc::now(),
            },
        );
        plans.truncate(SAVED_PLANS_LIMIT);

        let json = serde_json::to_string(&plans)?;
        self.cache.set(SAVED_PLANS_KEY, &json).await
    }

    /// The locally saved plan library, newest first.
    pub async fn saved_plans(&self) -> Result<Vec<SavedPlan>, StorageError> {
        match self.cache.get(SAVED_PLANS_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}
