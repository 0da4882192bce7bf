//! Client for the grocery-checkout-link service.
//!
//! A link can be created from a persisted plan id (cheaper, server already
//! has the ingredients) or from a flat list of items extracted client-side.

use async_trait::async_trait;
use mealsmith_shopping::CheckoutItem;
use serde_json::{json, Value};

use crate::error::AppError;

/// A created checkout link.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLink {
    pub url: String,
    pub item_count: u32,
}

/// Seam for the checkout-link backend.
#[async_trait]
pub trait CheckoutLinker: Send + Sync {
    async fn link_for_saved_plan(&self, plan_id: &str) -> Result<CheckoutLink, AppError>;
    async fn link_for_items(&self, items: &[CheckoutItem]) -> Result<CheckoutLink, AppError>;
}

/// reqwest-backed checkout client.
pub struct CheckoutClient {
    http: reqwest::Client,
    services_url: String,
    auth_token: String,
}

impl CheckoutClient {
    pub fn new(
        http: reqwest::Client,
        services_url: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            services_url: services_url.into(),
            auth_token: auth_token.into(),
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, AppError> {
        let mut req = self
            .http
            .post(format!("{}{}", self.services_url, path))
            .json(&body);
        if !self.auth_token.is_empty() {
            req = req.bearer_auth(&self.auth_token);
        }
        Ok(req.send().await?.error_for_status()?.json::<Value>().await?)
    }
}

#[async_trait]
impl CheckoutLinker for CheckoutClient {
    #[tracing::instrument(skip(self))]
    async fn link_for_saved_plan(&self, plan_id: &str) -> Result<CheckoutLink, AppError> {
        let payload = self
            .post("/api/checkout/meal-plan", json!({ "mealPlanId": plan_id }))
            .await?;
        parse_link(&payload)
    }

    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    async fn link_for_items(&self, items: &[CheckoutItem]) -> Result<CheckoutLink, AppError> {
        let payload = self
            .post("/api/checkout/create-list", json!({ "items": items }))
            .await?;
        parse_link(&payload)
    }
}

/// Pull the link out of a checkout response. The service wraps results as
/// `{success, data: {...}}` but older deployments return the fields at the
/// top level, so both are accepted.
fn parse_link(payload: &Value) -> Result<CheckoutLink, AppError> {
    let body = payload.get("data").filter(|v| v.is_object()).unwrap_or(payload);

    let url = body
        .get("productsLinkUrl")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .ok_or(AppError::MissingLink)?;

    let item_count = body
        .get("itemCount")
        .or_else(|| body.get("ingredientCount"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;

    Ok(CheckoutLink {
        url: url.to_string(),
        item_count,
    })
}
