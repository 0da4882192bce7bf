use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Canonical meal plan produced by the normalizer.
///
/// Every downstream consumer (shopping list extraction, checkout, local
/// persistence) works against this shape, never against the raw backend
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    /// Backend-assigned identifier, absent until the plan is persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub name: String,
    pub description: String,
    pub duration_days: u32,
    pub servings: u32,
    pub created_at: DateTime<Utc>,
    pub days: Vec<PlanDay>,
    pub summary: PlanSummary,
}

impl MealPlan {
    /// True when generation produced no usable content. Callers must surface
    /// this as a failure with a retry affordance, not as a silent empty plan.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Total number of meals across all days.
    pub fn total_meals(&self) -> usize {
        self.days.iter().map(|d| d.meals.len()).sum()
    }
}

/// Plan-level aggregates, always derived from `days` by the normalizer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_meals: u32,
    pub avg_calories_per_day: f64,
    pub avg_protein_per_day: f64,
    pub shopping_list_available: bool,
}

/// One day of a meal plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
    pub date: NaiveDate,
    pub day_number: u32,
    pub day_name: String,
    pub meals: Vec<PlanMeal>,
    /// Always recomputed as the sum over `meals`, never taken from the
    /// source payload.
    pub totals: DayTotals,
    pub has_breakfast: bool,
    pub has_lunch: bool,
    pub has_dinner: bool,
    pub has_snack: bool,
}

/// Per-day nutrition totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DayTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// A single meal within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMeal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<String>,
    pub meal_type: MealType,
    pub meal_name: String,
    pub description: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub servings: u32,
    pub prep_time_min: u32,
    pub cook_time_min: u32,
    pub ingredients: Vec<MealIngredient>,
    pub instructions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Meal slot within a day.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Dessert,
}

impl MealType {
    /// Parse a loosely-typed meal type string; unknown values fall back to
    /// dinner, matching the backend's default slot.
    pub fn parse_or_default(value: &str) -> Self {
        value.trim().parse().unwrap_or(MealType::Dinner)
    }
}

/// One ingredient line of a meal. Ingredients without a name survive
/// normalization but are dropped during shopping-list extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealIngredient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_parses_known_values() {
        assert_eq!(MealType::parse_or_default("breakfast"), MealType::Breakfast);
        assert_eq!(MealType::parse_or_default("Lunch"), MealType::Lunch);
        assert_eq!(MealType::parse_or_default("DINNER"), MealType::Dinner);
        assert_eq!(MealType::parse_or_default("snack"), MealType::Snack);
        assert_eq!(MealType::parse_or_default("dessert"), MealType::Dessert);
    }

    #[test]
    fn meal_type_defaults_to_dinner() {
        assert_eq!(MealType::parse_or_default("brunch"), MealType::Dinner);
        assert_eq!(MealType::parse_or_default(""), MealType::Dinner);
    }

    #[test]
    fn meal_type_displays_lowercase() {
        assert_eq!(MealType::Breakfast.to_string(), "breakfast");
        assert_eq!(MealType::Dessert.to_string(), "dessert");
    }
}
