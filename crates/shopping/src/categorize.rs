use serde::{Deserialize, Serialize};

/// Grocery category for shopping-list organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Proteins,
    Produce,
    Dairy,
    Grains,
    Pantry,
    Other,
}

impl Category {
    /// All categories in classification priority order. An ingredient
    /// matching keywords from two categories is assigned to whichever comes
    /// first here.
    pub const ALL: [Category; 6] = [
        Category::Proteins,
        Category::Produce,
        Category::Dairy,
        Category::Grains,
        Category::Pantry,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Proteins => "Proteins",
            Category::Produce => "Produce",
            Category::Dairy => "Dairy",
            Category::Grains => "Grains",
            Category::Pantry => "Pantry",
            Category::Other => "Other",
        }
    }
}

/// Keyword lists that drive ingredient classification.
///
/// Built once at startup and passed into the extractor; the default carries
/// the built-in lists below. Matching is lowercase substring against each
/// category's keywords, first category in priority order wins, unmatched
/// ingredients fall through to [`Category::Other`].
#[derive(Debug, Clone)]
pub struct CategoryRules {
    rules: Vec<(Category, Vec<String>)>,
}

const PROTEIN_KEYWORDS: &[&str] = &[
    "chicken", "beef", "pork", "turkey", "fish", "salmon", "tuna", "shrimp", "egg", "tofu",
    "tempeh", "lamb", "steak", "bacon", "sausage",
];

const PRODUCE_KEYWORDS: &[&str] = &[
    "spinach", "lettuce", "tomato", "onion", "garlic", "pepper", "broccoli", "carrot", "celery",
    "cucumber", "mushroom", "zucchini", "asparagus", "kale", "cabbage", "potato", "sweet potato",
    "avocado", "lemon", "lime", "apple", "banana", "berry", "orange",
];

const DAIRY_KEYWORDS: &[&str] = &[
    "milk", "cheese", "yogurt", "butter", "cream", "sour cream", "cottage cheese", "parmesan",
    "mozzarella", "feta",
];

const GRAIN_KEYWORDS: &[&str] = &[
    "rice", "pasta", "bread", "tortilla", "quinoa", "oat", "flour", "noodle", "couscous", "barley",
];

const PANTRY_KEYWORDS: &[&str] = &[
    "oil", "olive oil", "vinegar", "soy sauce", "salt", "pepper", "spice", "herb", "rosemary",
    "thyme", "basil", "oregano", "cumin", "paprika", "cinnamon", "honey", "maple syrup", "sugar",
    "stock", "broth",
];

impl Default for CategoryRules {
    fn default() -> Self {
        let keywords = |list: &[&str]| list.iter().map(|k| k.to_string()).collect();
        Self {
            rules: vec![
                (Category::Proteins, keywords(PROTEIN_KEYWORDS)),
                (Category::Produce, keywords(PRODUCE_KEYWORDS)),
                (Category::Dairy, keywords(DAIRY_KEYWORDS)),
                (Category::Grains, keywords(GRAIN_KEYWORDS)),
                (Category::Pantry, keywords(PANTRY_KEYWORDS)),
            ],
        }
    }
}

impl CategoryRules {
    /// Classify an ingredient by name.
    pub fn categorize(&self, ingredient_name: &str) -> Category {
        let normalized = ingredient_name.trim().to_lowercase();
        for (category, keywords) in &self.rules {
            if keywords.iter().any(|k| normalized.contains(k.as_str())) {
                return *category;
            }
        }
        Category::Other
    }
}
