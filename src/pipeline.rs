//! Pipeline driver: generate → normalize → accept → checkout link.
//!
//! Every step is awaited sequentially; nothing is spawned and nothing is
//! retried here. Failures propagate so the caller can offer a retry.

use std::sync::Mutex;

use mealsmith_mealplan::{normalize_plan, MealPlan, NormalizeContext};
use mealsmith_shopping::{extract_shopping_list, CategoryRules, ShoppingList};
use mealsmith_storage::{CheckoutLinkStore, SavedPlan, SessionStore};

use crate::clients::{CheckoutLink, CheckoutLinker, GenerateMealPlanRequest, PlanGenerator};
use crate::error::AppError;

/// Lifecycle of a user-triggered action. Replaces ad-hoc boolean flags with
/// one explicit state machine per action, so re-entrancy is rejected instead
/// of racing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    InFlight,
    Done,
    Failed,
}

/// One action's state behind a mutex, so the pipeline can be shared by
/// reference across tasks.
#[derive(Debug, Default)]
pub struct ActionCell {
    state: Mutex<ActionState>,
}

impl ActionCell {
    /// Move to `InFlight`, rejecting if the action is already running.
    pub fn begin(&self, name: &'static str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == ActionState::InFlight {
            return Err(AppError::ActionInFlight(name));
        }
        *state = ActionState::InFlight;
        Ok(())
    }

    pub fn finish(&self, ok: bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = if ok {
            ActionState::Done
        } else {
            ActionState::Failed
        };
    }

    pub fn get(&self) -> ActionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Orchestrates the full meal-plan flow against pluggable backends.
pub struct MealPlanPipeline<G, C, S>
where
    G: PlanGenerator,
    C: CheckoutLinker,
    S: SessionStore,
{
    generator: G,
    checkout: C,
    links: CheckoutLinkStore<S>,
    rules: CategoryRules,
    generation: ActionCell,
    linking: ActionCell,
}

impl<G, C, S> MealPlanPipeline<G, C, S>
where
    G: PlanGenerator,
    C: CheckoutLinker,
    S: SessionStore,
{
    pub fn new(generator: G, checkout: C, links: CheckoutLinkStore<S>) -> Self {
        Self {
            generator,
            checkout,
            links,
            rules: CategoryRules::default(),
            generation: ActionCell::default(),
            linking: ActionCell::default(),
        }
    }

    /// Generate a plan and normalize it. An unusable payload surfaces as
    /// [`AppError::EmptyGeneration`], never as a silently empty plan.
    pub async fn generate(
        &self,
        request: &GenerateMealPlanRequest,
    ) -> Result<MealPlan, AppError> {
        self.generation.begin("meal plan generation")?;
        let result = self.generate_inner(request).await;
        self.generation.finish(result.is_ok());
        result
    }

    async fn generate_inner(
        &self,
        request: &GenerateMealPlanRequest,
    ) -> Result<MealPlan, AppError> {
        let raw = self.generator.generate(request).await?;

        let ctx = NormalizeContext::new(request.servings.unwrap_or(2), request.duration)
            .with_description(request.description.clone());
        let plan = normalize_plan(&raw, &ctx);
        if plan.is_empty() {
            tracing::warn!("generation payload yielded no days");
            return Err(AppError::EmptyGeneration);
        }

        tracing::info!(
            days = plan.days.len(),
            meals = plan.total_meals(),
            "normalized generated plan"
        );
        Ok(plan)
    }

    /// Accept a plan: derive its shopping list and cache it on-device.
    pub async fn accept(&self, plan: &MealPlan) -> Result<ShoppingList, AppError> {
        let list = extract_shopping_list(plan, &self.rules);
        self.links.save_shopping_list(&list).await?;
        Ok(list)
    }

    /// Create a checkout link for the plan and persist the URL through both
    /// storage tiers. The saved-plan endpoint is tried first when the plan
    /// has an id; a failed link creation still leaves the shopping list
    /// cached so the user can shop manually.
    pub async fn create_checkout_link(&self, plan: &MealPlan) -> Result<CheckoutLink, AppError> {
        self.linking.begin("checkout link creation")?;
        let result = self.create_link_inner(plan).await;
        self.linking.finish(result.is_ok());
        result
    }

    async fn create_link_inner(&self, plan: &MealPlan) -> Result<CheckoutLink, AppError> {
        let list = extract_shopping_list(plan, &self.rules);

        let link = match self.request_link(plan, &list).await {
            Ok(link) => link,
            Err(err) => {
                if let Err(cache_err) = self.links.save_shopping_list(&list).await {
                    tracing::warn!(error = %cache_err, "could not cache shopping list after checkout failure");
                }
                return Err(err);
            }
        };

        self.links
            .save_url_for_plan(plan.plan_id.as_deref(), &link.url)
            .await?;
        Ok(link)
    }

    async fn request_link(
        &self,
        plan: &MealPlan,
        list: &ShoppingList,
    ) -> Result<CheckoutLink, AppError> {
        if let Some(plan_id) = plan.plan_id.as_deref() {
            match self.checkout.link_for_saved_plan(plan_id).await {
                Ok(link) => return Ok(link),
                Err(err) => {
                    tracing::warn!(error = %err, "saved-plan checkout endpoint failed, extracting items");
                }
            }
        }

        let items = list.checkout_items();
        if items.is_empty() {
            return Err(AppError::EmptyShoppingList);
        }
        self.checkout.link_for_items(&items).await
    }

    /// Load the saved checkout URL for a plan through both tiers.
    pub async fn saved_link(&self, plan_id: Option<&str>) -> Result<Option<String>, AppError> {
        Ok(self.links.load_url_for_plan(plan_id).await?)
    }

    /// The on-device shopping list of the last accepted plan.
    pub async fn cached_shopping_list(&self) -> Result<Option<ShoppingList>, AppError> {
        Ok(self.links.load_shopping_list().await?)
    }

    /// Keep an accepted plan in the local library.
    pub async fn save_plan_locally(
        &self,
        plan: &MealPlan,
        checkout_url: Option<&str>,
    ) -> Result<(), AppError> {
        Ok(self.links.save_plan_locally(plan, checkout_url).await?)
    }

    pub async fn saved_plans(&self) -> Result<Vec<SavedPlan>, AppError> {
        Ok(self.links.saved_plans().await?)
    }

    pub fn generation_state(&self) -> ActionState {
        self.generation.get()
    }

    pub fn linking_state(&self) -> ActionState {
        self.linking.get()
    }
}
