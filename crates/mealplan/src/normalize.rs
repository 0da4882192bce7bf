//! Plan normalizer: converts the loosely-shaped meal-generation payload into
//! a canonical [`MealPlan`].
//!
//! The backend is known to return plan data in several shapes:
//! - nested under a `plan` field, or at the top level;
//! - days as `{meals: [...]}` arrays, or as separate `breakfast`/`lunch`/
//!   `dinner` objects per day;
//! - a flat `recipes` array with each recipe tagged with a `day` number;
//! - a single quick-mode `meal` object with no day wrapper at all.
//!
//! The normalizer never fails: missing or malformed fields are defaulted in
//! place, and a payload no rule recognizes yields an empty `days` sequence,
//! which callers must treat as "generation produced no usable content".

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde_json::Value;

use crate::types::{DayTotals, MealIngredient, MealPlan, MealType, PlanDay, PlanMeal, PlanSummary};

/// Request-derived defaults and the reference clock for normalization.
///
/// Passed explicitly so the normalization itself stays a pure function of
/// its inputs.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
    pub default_servings: u32,
    pub default_duration_days: u32,
    pub default_description: Option<String>,
}

impl NormalizeContext {
    pub fn new(default_servings: u32, default_duration_days: u32) -> Self {
        Self::at(Utc::now(), default_servings, default_duration_days)
    }

    /// Context pinned to a fixed instant. Tests use this to make date
    /// defaulting deterministic.
    pub fn at(now: DateTime<Utc>, default_servings: u32, default_duration_days: u32) -> Self {
        Self {
            today: now.date_naive(),
            now,
            default_servings: default_servings.max(1),
            default_duration_days: default_duration_days.max(1),
            default_description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.trim().is_empty() {
            self.default_description = Some(description);
        }
        self
    }
}

/// Normalize an arbitrarily-shaped generation payload into a canonical plan.
///
/// Output always satisfies the model invariants: day totals and `has_*`
/// flags are recomputed from the final meals, and plan summary aggregates
/// are derived rather than trusted from the source.
pub fn normalize_plan(raw: &Value, ctx: &NormalizeContext) -> MealPlan {
    let plan_obj = raw.get("plan").filter(|v| v.is_object()).unwrap_or(raw);
    let quick_meal = raw
        .get("meal")
        .or_else(|| plan_obj.get("meal"))
        .filter(|v| v.is_object());

    let days_raw = first_array(plan_obj, &["days", "meal_days"])
        .or_else(|| first_array(raw, &["days", "meal_days"]))
        .map(|a| a.as_slice())
        .unwrap_or(&[]);

    let days: Vec<PlanDay> = if !days_raw.is_empty() && is_slot_shaped(days_raw) {
        tracing::debug!("converting breakfast/lunch/dinner day shape to meals arrays");
        days_from_slots(days_raw, ctx)
    } else if !days_raw.is_empty() {
        days_raw
            .iter()
            .enumerate()
            .map(|(idx, day)| normalize_day(day, idx, ctx))
            .collect()
    } else if let Some(recipes) = first_array(plan_obj, &["recipes"]).filter(|r| !r.is_empty()) {
        tracing::debug!(recipes = recipes.len(), "grouping flat recipes array into days");
        days_from_recipes(recipes, ctx)
    } else if let Some(meal) = quick_meal {
        tracing::debug!("converting quick-mode single meal to a one-day plan");
        vec![day_from_quick_meal(meal, ctx)]
    } else {
        Vec::new()
    };

    let duration_days = first_u32(plan_obj, &["duration", "duration_days"])
        .or_else(|| first_u32(raw, &["duration_days", "duration"]))
        .filter(|d| *d > 0)
        .unwrap_or(ctx.default_duration_days);

    let name = first_str(plan_obj, &["name"])
        .or_else(|| first_str(raw, &["name"]))
        .or_else(|| quick_meal.and_then(|m| first_str(m, &["name"])))
        .unwrap_or_else(|| format!("{duration_days}-Day Meal Plan"));

    let plan_id = first_str(plan_obj, &["program_id", "mealPlanId"])
        .or_else(|| first_str(raw, &["plan_id", "id"]))
        .or_else(|| quick_meal.and_then(|m| first_str(m, &["id"])));

    let description = first_str(plan_obj, &["description"])
        .or_else(|| first_str(raw, &["description"]))
        .or_else(|| ctx.default_description.clone())
        .unwrap_or_else(|| "Custom meal plan".to_string());

    let servings = nested_u32(plan_obj, "parsedRequest", "servings")
        .or_else(|| first_u32(raw, &["servings"]))
        .or_else(|| quick_meal.and_then(|m| first_u32(m, &["servings"])))
        .filter(|s| *s > 0)
        .unwrap_or(ctx.default_servings);

    let created_at = first_str(plan_obj, &["generated_at"])
        .or_else(|| first_str(raw, &["created_at", "timestamp"]))
        .and_then(|s| parse_datetime(&s))
        .unwrap_or(ctx.now);

    let summary = derive_summary(&days);

    MealPlan {
        plan_id,
        name,
        description,
        duration_days,
        servings,
        created_at,
        days,
        summary,
    }
}

/// Plan summary is always an aggregate over the final days.
fn derive_summary(days: &[PlanDay]) -> PlanSummary {
    let total_meals: usize = days.iter().map(|d| d.meals.len()).sum();
    let day_count = days.len() as f64;
    let (avg_calories_per_day, avg_protein_per_day) = if days.is_empty() {
        (0.0, 0.0)
    } else {
        (
            days.iter().map(|d| d.totals.calories).sum::<f64>() / day_count,
            days.iter().map(|d| d.totals.protein).sum::<f64>() / day_count,
        )
    };
    let shopping_list_available = days.iter().any(|d| {
        d.meals
            .iter()
            .any(|m| m.ingredients.iter().any(|i| !i.name.trim().is_empty()))
    });

    PlanSummary {
        total_meals: total_meals as u32,
        avg_calories_per_day,
        avg_protein_per_day,
        shopping_list_available,
    }
}

/// True when every day entry lacks a `meals` array and at least one carries
/// a breakfast/lunch/dinner slot object instead.
fn is_slot_shaped(days: &[Value]) -> bool {
    let lacks_meals = days
        .iter()
        .all(|d| d.get("meals").map_or(true, |m| !m.is_array()));
    let has_slot = days.iter().any(|d| {
        ["breakfast", "lunch", "dinner"]
            .iter()
            .any(|slot| d.get(*slot).is_some_and(|v| v.is_object()))
    });
    lacks_meals && has_slot
}

fn days_from_slots(days_raw: &[Value], ctx: &NormalizeContext) -> Vec<PlanDay> {
    days_raw
        .iter()
        .enumerate()
        .map(|(idx, day)| {
            let slots = [
                ("breakfast", MealType::Breakfast, "Breakfast"),
                ("lunch", MealType::Lunch, "Lunch"),
                ("dinner", MealType::Dinner, "Dinner"),
            ];
            let mut meals = Vec::new();
            for (key, meal_type, default_name) in slots {
                if let Some(raw_meal) = day.get(key).filter(|v| v.is_object()) {
                    meals.push(normalize_meal_with_defaults(
                        raw_meal,
                        ctx,
                        default_name,
                        Some(meal_type),
                    ));
                }
            }
            finish_day(day_date(day, idx, ctx), day_number(day, idx), day_name_of(day), meals)
        })
        .collect()
}

fn days_from_recipes(recipes: &[Value], ctx: &NormalizeContext) -> Vec<PlanDay> {
    // Group by the recipe's day tag (default day 1) in day-number order;
    // recipes sharing a day keep their first-seen order.
    let mut grouped: std::collections::BTreeMap<u32, Vec<PlanMeal>> =
        std::collections::BTreeMap::new();
    for recipe in recipes {
        if !recipe.is_object() {
            continue;
        }
        let day = first_u32(recipe, &["day"]).filter(|d| *d > 0).unwrap_or(1);
        grouped.entry(day).or_default().push(normalize_meal(recipe, ctx));
    }

    grouped
        .into_iter()
        .map(|(number, meals)| {
            let date = ctx.today + Duration::days(i64::from(number) - 1);
            finish_day(date, number, None, meals)
        })
        .collect()
}

fn day_from_quick_meal(meal: &Value, ctx: &NormalizeContext) -> PlanDay {
    finish_day(ctx.today, 1, None, vec![normalize_meal(meal, ctx)])
}

fn normalize_day(day: &Value, idx: usize, ctx: &NormalizeContext) -> PlanDay {
    let meals = day
        .get("meals")
        .and_then(Value::as_array)
        .map(|meals| {
            meals
                .iter()
                .filter(|m| m.is_object())
                .map(|m| normalize_meal(m, ctx))
                .collect()
        })
        .unwrap_or_default();

    finish_day(day_date(day, idx, ctx), day_number(day, idx), day_name_of(day), meals)
}

/// Single construction point for days: totals and `has_*` flags are derived
/// from the final meals here and nowhere else.
fn finish_day(
    date: NaiveDate,
    number: u32,
    name: Option<String>,
    meals: Vec<PlanMeal>,
) -> PlanDay {
    let totals = DayTotals {
        calories: meals.iter().map(|m| m.calories).sum(),
        protein: meals.iter().map(|m| m.protein).sum(),
        carbs: meals.iter().map(|m| m.carbs).sum(),
        fat: meals.iter().map(|m| m.fat).sum(),
    };
    let has = |t: MealType| meals.iter().any(|m| m.meal_type == t);

    PlanDay {
        date,
        day_number: number,
        day_name: name.unwrap_or_else(|| weekday_name(date)),
        has_breakfast: has(MealType::Breakfast),
        has_lunch: has(MealType::Lunch),
        has_dinner: has(MealType::Dinner),
        has_snack: has(MealType::Snack),
        totals,
        meals,
    }
}

fn normalize_meal(raw: &Value, ctx: &NormalizeContext) -> PlanMeal {
    normalize_meal_with_defaults(raw, ctx, "Meal", None)
}

fn normalize_meal_with_defaults(
    raw: &Value,
    ctx: &NormalizeContext,
    default_name: &str,
    forced_type: Option<MealType>,
) -> PlanMeal {
    let nutrition = get_first(raw, &["nutritionInfo", "nutrition"]);

    let meal_type = forced_type.unwrap_or_else(|| {
        first_str(raw, &["meal_type", "mealType", "type"])
            .map(|s| MealType::parse_or_default(&s))
            .unwrap_or(MealType::Dinner)
    });

    PlanMeal {
        meal_id: first_str(raw, &["meal_id", "id"]),
        meal_type,
        meal_name: first_str(raw, &["meal_name", "name"])
            .unwrap_or_else(|| default_name.to_string()),
        description: first_str(raw, &["description"]).unwrap_or_default(),
        calories: nutrient(nutrition, &["calories", "caloriesPerServing"])
            .or_else(|| first_f64(raw, &["calories"]))
            .unwrap_or(0.0)
            .max(0.0),
        protein: nutrient(nutrition, &["protein_g", "protein"])
            .or_else(|| first_f64(raw, &["protein", "protein_g"]))
            .unwrap_or(0.0)
            .max(0.0),
        carbs: nutrient(nutrition, &["carbs_g", "carbs"])
            .or_else(|| first_f64(raw, &["carbs", "carbs_g"]))
            .unwrap_or(0.0)
            .max(0.0),
        fat: nutrient(nutrition, &["fat_g", "fat"])
            .or_else(|| first_f64(raw, &["fat", "fat_g"]))
            .unwrap_or(0.0)
            .max(0.0),
        servings: first_u32(raw, &["servings"])
            .filter(|s| *s > 0)
            .unwrap_or(ctx.default_servings),
        prep_time_min: first_u32(raw, &["prep_time_min", "prep_time", "prepTime"]).unwrap_or(0),
        cook_time_min: first_u32(raw, &["cook_time_min", "cook_time", "cookTime"]).unwrap_or(0),
        ingredients: raw
            .get("ingredients")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(normalize_ingredient).collect())
            .unwrap_or_default(),
        instructions: raw
            .get("instructions")
            .and_then(Value::as_array)
            .map(|steps| {
                steps
                    .iter()
                    .filter_map(|s| s.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
        image_url: first_str(raw, &["image_url", "imageUrl"]),
    }
}

fn normalize_ingredient(raw: &Value) -> Option<MealIngredient> {
    match raw {
        // Some generators emit bare ingredient strings.
        Value::String(name) => Some(MealIngredient {
            name: name.clone(),
            amount: 0.0,
            unit: String::new(),
        }),
        Value::Object(_) => Some(MealIngredient {
            name: first_str(raw, &["name"]).unwrap_or_default(),
            amount: first_f64(raw, &["amount", "quantity"]).unwrap_or(0.0).max(0.0),
            unit: first_str(raw, &["unit"]).unwrap_or_default(),
        }),
        _ => None,
    }
}

fn day_date(day: &Value, idx: usize, ctx: &NormalizeContext) -> NaiveDate {
    first_str(day, &["date"])
        .and_then(|s| parse_date(&s))
        .unwrap_or_else(|| ctx.today + Duration::days(idx as i64))
}

fn day_number(day: &Value, idx: usize) -> u32 {
    first_u32(day, &["day_number", "dayNumber"])
        .filter(|n| *n > 0)
        .unwrap_or(idx as u32 + 1)
}

fn day_name_of(day: &Value) -> Option<String> {
    first_str(day, &["day_name", "dayName"])
}

fn weekday_name(date: NaiveDate) -> String {
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
    .to_string()
}

// --- loose payload accessors -------------------------------------------------

/// First present, non-null value among alternate field spellings.
fn get_first<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find(|v| !v.is_null())
}

fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
    get_first(value, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_f64(value: &Value, keys: &[&str]) -> Option<f64> {
    get_first(value, keys).and_then(as_number)
}

fn first_u32(value: &Value, keys: &[&str]) -> Option<u32> {
    first_f64(value, keys)
        .filter(|n| *n >= 0.0)
        .map(|n| n.round() as u32)
}

fn first_array<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().filter_map(|k| value.get(*k)).find_map(Value::as_array)
}

fn nested_u32(value: &Value, outer: &str, inner: &str) -> Option<u32> {
    value.get(outer).and_then(|v| first_u32(v, &[inner]))
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Nutrition fields may be numbers, numeric strings, or `{amount}` objects.
fn nutrient(nutrition: Option<&Value>, keys: &[&str]) -> Option<f64> {
    let nutrition = nutrition?;
    for key in keys {
        if let Some(v) = nutrition.get(*key).filter(|v| !v.is_null()) {
            if let Some(n) = as_number(v) {
                return Some(n);
            }
            if let Some(n) = v.get("amount").and_then(as_number) {
                return Some(n);
            }
        }
    }
    None
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let prefix = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
