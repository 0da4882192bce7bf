pub mod cache;
pub mod error;
pub mod links;
pub mod session;

// Re-export commonly used types
pub use cache::LocalCache;
pub use error::StorageError;
pub use links::{CheckoutLinkStore, SavedPlan};
pub use session::{MemorySessionStore, SessionStore};
