//! Shopping-list extraction: flattens every ingredient of a canonical plan,
//! classifies each line into a grocery category, and merges duplicates.

use std::collections::HashMap;

use mealsmith_mealplan::MealPlan;
use serde::{Deserialize, Serialize};

use crate::categorize::{Category, CategoryRules};

/// One merged shopping-list line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Categorized shopping list derived from a meal plan.
///
/// All six categories are always present; empty ones stay empty and callers
/// display only the non-empty buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub proteins: Vec<ShoppingItem>,
    pub produce: Vec<ShoppingItem>,
    pub dairy: Vec<ShoppingItem>,
    pub grains: Vec<ShoppingItem>,
    pub pantry: Vec<ShoppingItem>,
    pub other: Vec<ShoppingItem>,
}

impl ShoppingList {
    pub fn bucket(&self, category: Category) -> &[ShoppingItem] {
        match category {
            Category::Proteins => &self.proteins,
            Category::Produce => &self.produce,
            Category::Dairy => &self.dairy,
            Category::Grains => &self.grains,
            Category::Pantry => &self.pantry,
            Category::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<ShoppingItem> {
        match category {
            Category::Proteins => &mut self.proteins,
            Category::Produce => &mut self.produce,
            Category::Dairy => &mut self.dairy,
            Category::Grains => &mut self.grains,
            Category::Pantry => &mut self.pantry,
            Category::Other => &mut self.other,
        }
    }

    /// Categories in priority order with their items.
    pub fn categories(&self) -> impl Iterator<Item = (Category, &[ShoppingItem])> {
        Category::ALL.into_iter().map(|c| (c, self.bucket(c)))
    }

    pub fn total_items(&self) -> usize {
        Category::ALL.iter().map(|c| self.bucket(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }

    /// Flatten all categories into checkout lines for the grocery
    /// integration: zero amounts become quantity 1, empty units become
    /// "item".
    pub fn checkout_items(&self) -> Vec<CheckoutItem> {
        self.categories()
            .flat_map(|(_, items)| items)
            .filter(|item| !item.name.is_empty())
            .map(|item| CheckoutItem {
                name: item.name.clone(),
                quantity: if item.amount > 0.0 { item.amount } else { 1.0 },
                unit: if item.unit.is_empty() {
                    "item".to_string()
                } else {
                    item.unit.clone()
                },
            })
            .collect()
    }
}

/// Flat `{name, quantity, unit}` line sent to the checkout-link API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Derive a categorized shopping list from every ingredient in the plan.
///
/// Ingredients without a name are skipped; every named ingredient lands in
/// exactly one category. Duplicate lines merge by `(lowercased name, unit)`
/// with amounts summed, keeping the first-encountered spelling and order.
pub fn extract_shopping_list(plan: &MealPlan, rules: &CategoryRules) -> ShoppingList {
    let mut list = ShoppingList::default();
    let mut positions: HashMap<(Category, String, String), usize> = HashMap::new();

    for day in &plan.days {
        for meal in &day.meals {
            for ingredient in &meal.ingredients {
                if ingredient.name.trim().is_empty() {
                    continue;
                }
                let category = rules.categorize(&ingredient.name);
                let key = (
                    category,
                    ingredient.name.to_lowercase(),
                    ingredient.unit.clone(),
                );
                let bucket = list.bucket_mut(category);
                match positions.get(&key) {
                    Some(&idx) => bucket[idx].amount += ingredient.amount.max(0.0),
                    None => {
                        positions.insert(key, bucket.len());
                        bucket.push(ShoppingItem {
                            name: ingredient.name.clone(),
                            amount: ingredient.amount.max(0.0),
                            unit: ingredient.unit.clone(),
                        });
                    }
                }
            }
        }
    }

    tracing::debug!(items = list.total_items(), "extracted shopping list");
    list
}

/// Display form of a shopping line: "1.5 lb Chicken Breast", or just the
/// name when no amount is known.
pub fn format_item(item: &ShoppingItem) -> String {
    if item.amount > 0.0 {
        let amount = if item.amount.fract() == 0.0 {
            format!("{}", item.amount as i64)
        } else {
            format!("{}", item.amount)
        };
        if item.unit.is_empty() {
            format!("{amount} {}", item.name)
        } else {
            format!("{amount} {} {}", item.unit, item.name)
        }
    } else {
        item.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, amount: f64, unit: &str) -> ShoppingItem {
        ShoppingItem {
            name: name.to_string(),
            amount,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn format_item_with_amount_and_unit() {
        assert_eq!(format_item(&item("Chicken Breast", 1.5, "lb")), "1.5 lb Chicken Breast");
        assert_eq!(format_item(&item("Spinach", 2.0, "cups")), "2 cups Spinach");
    }

    #[test]
    fn format_item_without_amount() {
        assert_eq!(format_item(&item("Salt", 0.0, "")), "Salt");
    }

    #[test]
    fn format_item_with_amount_but_no_unit() {
        assert_eq!(format_item(&item("Avocado", 3.0, "")), "3 Avocado");
    }

    #[test]
    fn checkout_items_default_zero_amounts_and_empty_units() {
        let list = ShoppingList {
            pantry: vec![item("Salt", 0.0, "")],
            ..Default::default()
        };
        let items = list.checkout_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1.0);
        assert_eq!(items[0].unit, "item");
    }
}
