pub mod normalize;
pub mod types;

// Re-export commonly used types
pub use normalize::{normalize_plan, NormalizeContext};
pub use types::{
    DayTotals, MealIngredient, MealPlan, MealType, PlanDay, PlanMeal, PlanSummary,
};
