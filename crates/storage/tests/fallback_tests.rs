use async_trait::async_trait;
use chrono::Utc;
use mealsmith_mealplan::{MealPlan, PlanSummary};
use mealsmith_shopping::{ShoppingItem, ShoppingList};
use mealsmith_storage::{
    CheckoutLinkStore, LocalCache, MemorySessionStore, SessionStore, StorageError,
};

/// Session store that is always unreachable.
struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn save_url(
        &self,
        _user_id: &str,
        _plan_id: Option<&str>,
        _url: &str,
    ) -> Result<(), StorageError> {
        Err(StorageError::Session("connection refused".to_string()))
    }

    async fn get_url(
        &self,
        _user_id: &str,
        _plan_id: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        Err(StorageError::Session("connection refused".to_string()))
    }
}

async fn failing_store() -> CheckoutLinkStore<FailingSessionStore> {
    let cache = LocalCache::in_memory().await.unwrap();
    CheckoutLinkStore::new(FailingSessionStore, cache, "user-1")
}

fn plan(name: &str) -> MealPlan {
    MealPlan {
        plan_id: Some(format!("{name}-id")),
        name: name.to_string(),
        description: "Custom meal plan".to_string(),
        duration_days: 7,
        servings: 2,
        created_at: Utc::now(),
        days: Vec::new(),
        summary: PlanSummary::default(),
    }
}

#[tokio::test]
async fn url_saved_during_outage_is_still_readable() {
    let store = failing_store().await;

    store
        .save_url_for_plan(Some("plan-1"), "https://shop.example/cart/1")
        .await
        .unwrap();

    let url = store.load_url_for_plan(Some("plan-1")).await.unwrap();
    assert_eq!(url, Some("https://shop.example/cart/1".to_string()));
}

#[tokio::test]
async fn unknown_plan_falls_back_to_most_recent_url() {
    let store = failing_store().await;

    store
        .save_url_for_plan(Some("plan-1"), "https://shop.example/cart/1")
        .await
        .unwrap();
    store
        .save_url_for_plan(Some("plan-2"), "https://shop.example/cart/2")
        .await
        .unwrap();

    // Plan-scoped key wins when present.
    assert_eq!(
        store.load_url_for_plan(Some("plan-1")).await.unwrap(),
        Some("https://shop.example/cart/1".to_string())
    );
    // A plan that was never saved resolves to the most recent URL.
    assert_eq!(
        store.load_url_for_plan(Some("plan-99")).await.unwrap(),
        Some("https://shop.example/cart/2".to_string())
    );
    assert_eq!(
        store.load_url_for_plan(None).await.unwrap(),
        Some("https://shop.example/cart/2".to_string())
    );
}

#[tokio::test]
async fn remote_tier_is_preferred_when_reachable() {
    let session = MemorySessionStore::new();
    session
        .save_url("user-1", Some("plan-1"), "https://shop.example/remote")
        .await
        .unwrap();

    let cache = LocalCache::in_memory().await.unwrap();
    cache
        .set("checkout_url:plan-1", "https://shop.example/stale-local")
        .await
        .unwrap();

    let store = CheckoutLinkStore::new(session, cache, "user-1");
    assert_eq!(
        store.load_url_for_plan(Some("plan-1")).await.unwrap(),
        Some("https://shop.example/remote".to_string())
    );
}

#[tokio::test]
async fn missing_url_resolves_to_none() {
    let store = failing_store().await;
    assert_eq!(store.load_url_for_plan(Some("plan-1")).await.unwrap(), None);
    assert_eq!(store.load_url_for_plan(None).await.unwrap(), None);
}

#[tokio::test]
async fn shopping_list_round_trips_through_cache() {
    let store = failing_store().await;

    assert_eq!(store.load_shopping_list().await.unwrap(), None);

    let list = ShoppingList {
        proteins: vec![ShoppingItem {
            name: "Chicken Breast".to_string(),
            amount: 1.5,
            unit: "lb".to_string(),
        }],
        ..Default::default()
    };
    store.save_shopping_list(&list).await.unwrap();

    assert_eq!(store.load_shopping_list().await.unwrap(), Some(list));
}

#[tokio::test]
async fn saved_plan_library_is_newest_first_and_capped() {
    let store = failing_store().await;

    for i in 0..25 {
        store
            .save_plan_locally(&plan(&format!("plan-{i}")), None)
            .await
            .unwrap();
    }

    let plans = store.saved_plans().await.unwrap();
    assert_eq!(plans.len(), 20);
    assert_eq!(plans[0].plan.name, "plan-24");
    assert_eq!(plans[19].plan.name, "plan-5");
}

#[tokio::test]
async fn saved_plan_keeps_its_checkout_url() {
    let store = failing_store().await;

    store
        .save_plan_locally(&plan("weekly"), Some("https://shop.example/cart/1"))
        .await
        .unwrap();

    let plans = store.saved_plans().await.unwrap();
    assert_eq!(
        plans[0].checkout_url,
        Some("https://shop.example/cart/1".to_string())
    );
}
