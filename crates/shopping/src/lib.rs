pub mod categorize;
pub mod extract;

// Re-export commonly used types
pub use categorize::{Category, CategoryRules};
pub use extract::{
    extract_shopping_list, format_item, CheckoutItem, ShoppingItem, ShoppingList,
};
