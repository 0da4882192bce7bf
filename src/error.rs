use mealsmith_storage::StorageError;
use thiserror::Error;

/// Application-level errors surfaced by the clients and the pipeline.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generation returned a payload the normalizer could not extract any
    /// day from. Callers present this as a retryable failure, never as a
    /// silently empty plan.
    #[error("generation produced no usable meal plan")]
    EmptyGeneration,

    #[error("the plan has no named ingredients to shop for")]
    EmptyShoppingList,

    #[error("{0} is already in progress")]
    ActionInFlight(&'static str),

    #[error("checkout response did not contain a link")]
    MissingLink,
}
