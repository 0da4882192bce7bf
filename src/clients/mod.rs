pub mod checkout;
pub mod generation;
pub mod session;

pub use checkout::{CheckoutClient, CheckoutLink, CheckoutLinker};
pub use generation::{
    GenerateMealPlanRequest, GenerationMode, MacroTargets, MealGenerationClient, MealsPerDay,
    PlanGenerator,
};
pub use session::HttpSessionStore;
