use std::time::Duration;

use async_trait::async_trait;
use mealsmith::clients::{
    CheckoutLink, CheckoutLinker, GenerateMealPlanRequest, GenerationMode, PlanGenerator,
};
use mealsmith::error::AppError;
use mealsmith::pipeline::{ActionState, MealPlanPipeline};
use mealsmith_shopping::CheckoutItem;
use mealsmith_storage::{CheckoutLinkStore, LocalCache, MemorySessionStore};
use serde_json::{json, Value};

struct StubGenerator {
    payload: Value,
    delay: Duration,
}

impl StubGenerator {
    fn new(payload: Value) -> Self {
        Self {
            payload,
            delay: Duration::ZERO,
        }
    }

    fn slow(payload: Value, delay: Duration) -> Self {
        Self { payload, delay }
    }
}

#[async_trait]
impl PlanGenerator for StubGenerator {
    async fn generate(&self, _request: &GenerateMealPlanRequest) -> Result<Value, AppError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.payload.clone())
    }
}

struct StubCheckout {
    saved_plan_ok: bool,
    items_ok: bool,
}

#[async_trait]
impl CheckoutLinker for StubCheckout {
    async fn link_for_saved_plan(&self, plan_id: &str) -> Result<CheckoutLink, AppError> {
        if self.saved_plan_ok {
            Ok(CheckoutLink {
                url: format!("https://shop.example/plan/{plan_id}"),
                item_count: 10,
            })
        } else {
            Err(AppError::MissingLink)
        }
    }

    async fn link_for_items(&self, items: &[CheckoutItem]) -> Result<CheckoutLink, AppError> {
        if self.items_ok {
            Ok(CheckoutLink {
                url: "https://shop.example/items".to_string(),
                item_count: items.len() as u32,
            })
        } else {
            Err(AppError::MissingLink)
        }
    }
}

type TestPipeline = MealPlanPipeline<StubGenerator, StubCheckout, MemorySessionStore>;

async fn pipeline(generator: StubGenerator, checkout: StubCheckout) -> TestPipeline {
    let cache = LocalCache::in_memory().await.unwrap();
    let links = CheckoutLinkStore::new(MemorySessionStore::new(), cache, "user-1");
    MealPlanPipeline::new(generator, checkout, links)
}

fn backend_payload() -> Value {
    json!({
        "plan_id": "plan-1",
        "name": "Family Week",
        "days": [{
            "date": "2025-03-03",
            "meals": [
                {
                    "name": "Oats",
                    "meal_type": "breakfast",
                    "calories": 300,
                    "ingredients": [{"name": "Rolled Oats", "amount": 1, "unit": "cup"}]
                },
                {
                    "name": "Chicken Salad",
                    "meal_type": "dinner",
                    "calories": 550,
                    "ingredients": [
                        {"name": "Chicken Breast", "amount": 1, "unit": "lb"},
                        {"name": "Spinach", "amount": 2, "unit": "cups"}
                    ]
                }
            ]
        }]
    })
}

fn request() -> GenerateMealPlanRequest {
    GenerateMealPlanRequest::new(GenerationMode::Plan, "family dinners", 7)
}

#[tokio::test]
async fn generate_normalizes_the_backend_payload() {
    let p = pipeline(
        StubGenerator::new(backend_payload()),
        StubCheckout {
            saved_plan_ok: true,
            items_ok: true,
        },
    )
    .await;

    let plan = p.generate(&request()).await.unwrap();
    assert_eq!(plan.plan_id.as_deref(), Some("plan-1"));
    assert_eq!(plan.days.len(), 1);
    assert_eq!(plan.days[0].meals.len(), 2);
    assert_eq!(plan.days[0].totals.calories, 850.0);
    assert!(plan.days[0].has_breakfast);
    assert!(!plan.days[0].has_lunch);
    assert_eq!(p.generation_state(), ActionState::Done);
}

#[tokio::test]
async fn unusable_payload_surfaces_as_empty_generation() {
    let p = pipeline(
        StubGenerator::new(json!({ "status": "ok" })),
        StubCheckout {
            saved_plan_ok: true,
            items_ok: true,
        },
    )
    .await;

    assert!(matches!(
        p.generate(&request()).await,
        Err(AppError::EmptyGeneration)
    ));
    assert_eq!(p.generation_state(), ActionState::Failed);
}

#[tokio::test]
async fn accept_caches_the_shopping_list() {
    let p = pipeline(
        StubGenerator::new(backend_payload()),
        StubCheckout {
            saved_plan_ok: true,
            items_ok: true,
        },
    )
    .await;

    let plan = p.generate(&request()).await.unwrap();
    let list = p.accept(&plan).await.unwrap();
    assert_eq!(list.total_items(), 3);

    let cached = p.cached_shopping_list().await.unwrap();
    assert_eq!(cached, Some(list));
}

#[tokio::test]
async fn checkout_prefers_the_saved_plan_endpoint() {
    let p = pipeline(
        StubGenerator::new(backend_payload()),
        StubCheckout {
            saved_plan_ok: true,
            items_ok: true,
        },
    )
    .await;

    let plan = p.generate(&request()).await.unwrap();
    let link = p.create_checkout_link(&plan).await.unwrap();
    assert_eq!(link.url, "https://shop.example/plan/plan-1");

    // URL is persisted and loadable afterwards
    let saved = p.saved_link(Some("plan-1")).await.unwrap();
    assert_eq!(saved, Some(link.url));
}

#[tokio::test]
async fn checkout_falls_back_to_extracted_items() {
    let p = pipeline(
        StubGenerator::new(backend_payload()),
        StubCheckout {
            saved_plan_ok: false,
            items_ok: true,
        },
    )
    .await;

    let plan = p.generate(&request()).await.unwrap();
    let link = p.create_checkout_link(&plan).await.unwrap();
    assert_eq!(link.url, "https://shop.example/items");
    assert_eq!(link.item_count, 3);
    assert_eq!(p.linking_state(), ActionState::Done);
}

#[tokio::test]
async fn failed_checkout_still_leaves_the_list_cached() {
    let p = pipeline(
        StubGenerator::new(backend_payload()),
        StubCheckout {
            saved_plan_ok: false,
            items_ok: false,
        },
    )
    .await;

    let plan = p.generate(&request()).await.unwrap();
    assert!(p.create_checkout_link(&plan).await.is_err());
    assert_eq!(p.linking_state(), ActionState::Failed);

    let cached = p.cached_shopping_list().await.unwrap().unwrap();
    assert_eq!(cached.total_items(), 3);
    // No URL was persisted
    assert_eq!(p.saved_link(Some("plan-1")).await.unwrap(), None);
}

#[tokio::test]
async fn plan_without_ingredients_cannot_create_an_item_link() {
    let payload = json!({
        "days": [{
            "meals": [{ "name": "Mystery Bowl", "calories": 400 }]
        }]
    });
    let p = pipeline(
        StubGenerator::new(payload),
        StubCheckout {
            saved_plan_ok: false,
            items_ok: true,
        },
    )
    .await;

    let plan = p.generate(&request()).await.unwrap();
    assert!(matches!(
        p.create_checkout_link(&plan).await,
        Err(AppError::EmptyShoppingList)
    ));
}

#[tokio::test]
async fn concurrent_generation_is_rejected() {
    let p = pipeline(
        StubGenerator::slow(backend_payload(), Duration::from_millis(50)),
        StubCheckout {
            saved_plan_ok: true,
            items_ok: true,
        },
    )
    .await;

    let request = request();
    let (first, second) = tokio::join!(p.generate(&request), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        p.generate(&request).await
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(AppError::ActionInFlight(_))));
    assert_eq!(p.generation_state(), ActionState::Done);
}
