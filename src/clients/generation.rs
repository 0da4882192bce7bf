//! Client for the meal-generation API.
//!
//! The response payload is deliberately kept loose (`serde_json::Value`);
//! the backend returns plans in several shapes and the normalizer owns the
//! job of making sense of them.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

/// Generation mode the backend distinguishes on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GenerationMode {
    Quick,
    Plan,
    Diet,
    Saved,
}

/// Which meal slots each generated day should fill.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealsPerDay {
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
    pub snack: bool,
}

impl Default for MealsPerDay {
    fn default() -> Self {
        Self {
            breakfast: true,
            lunch: true,
            dinner: true,
            snack: false,
        }
    }
}

/// Daily macro targets as percentages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroTargets {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Request body for the meal-generation endpoint. Field names are dictated
/// by the backend and serialized camelCase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMealPlanRequest {
    pub mode: GenerationMode,
    /// Natural-language description, e.g. "easy family dinners for 4".
    pub description: String,
    /// Duration in days.
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    pub meals_per_day: MealsPerDay,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dietary_restrictions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preferred_stores: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_complexity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_constraint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macros_target: Option<MacroTargets>,
}

impl GenerateMealPlanRequest {
    pub fn new(mode: GenerationMode, description: impl Into<String>, duration: u32) -> Self {
        Self {
            mode,
            description: description.into(),
            duration,
            servings: None,
            meals_per_day: MealsPerDay::default(),
            dietary_restrictions: Vec::new(),
            preferred_stores: Vec::new(),
            cooking_complexity: None,
            time_constraint: None,
            daily_calorie_target: None,
            macros_target: None,
        }
    }
}

/// Seam for the generation backend, so the pipeline can be driven by stubs
/// in tests.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateMealPlanRequest) -> Result<Value, AppError>;
}

/// reqwest-backed generation client.
pub struct MealGenerationClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl MealGenerationClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            auth_token: auth_token.into(),
        }
    }
}

#[async_trait]
impl PlanGenerator for MealGenerationClient {
    #[tracing::instrument(skip(self, request), fields(mode = %request.mode, duration = request.duration))]
    async fn generate(&self, request: &GenerateMealPlanRequest) -> Result<Value, AppError> {
        let mut req = self
            .http
            .post(format!("{}/api/meals/create-from-text", self.base_url))
            .json(request);
        if !self.auth_token.is_empty() {
            req = req.bearer_auth(&self.auth_token);
        }

        let payload = req
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_camel_case() {
        let mut request =
            GenerateMealPlanRequest::new(GenerationMode::Plan, "family dinners", 7);
        request.servings = Some(4);
        request.dietary_restrictions = vec!["vegetarian".to_string()];

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["mode"], "plan");
        assert_eq!(json["duration"], 7);
        assert_eq!(json["servings"], 4);
        assert_eq!(json["mealsPerDay"]["breakfast"], true);
        assert_eq!(json["dietaryRestrictions"][0], "vegetarian");
        // Unset optionals are omitted entirely
        assert!(json.get("macrosTarget").is_none());
        assert!(json.get("preferredStores").is_none());
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("quick".parse::<GenerationMode>().unwrap(), GenerationMode::Quick);
        assert_eq!("Plan".parse::<GenerationMode>().unwrap(), GenerationMode::Plan);
        assert!("weekly".parse::<GenerationMode>().is_err());
    }
}
