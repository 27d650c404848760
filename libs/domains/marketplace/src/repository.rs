use async_trait::async_trait;
use uuid::Uuid;

use crate::error::MarketplaceResult;
use crate::models::{Category, Item, ItemFilter, MarketUser};

/// Item persistence.
///
/// `list` returns items in insertion order (`created_at`, then `id`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn insert(&self, item: Item) -> MarketplaceResult<Item>;

    async fn get_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Item>>;

    async fn list(&self, filter: ItemFilter) -> MarketplaceResult<Vec<Item>>;

    /// Overwrite a stored item. Fails with `ItemNotFound` if it is gone.
    async fn update(&self, item: Item) -> MarketplaceResult<Item>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> MarketplaceResult<bool>;

    /// Remove every item of a category; returns how many went.
    async fn delete_by_category(&self, category_id: Uuid) -> MarketplaceResult<u64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn insert(&self, category: Category) -> MarketplaceResult<Category>;

    async fn get_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Category>>;

    async fn list(&self) -> MarketplaceResult<Vec<Category>>;

    async fn exists(&self, id: Uuid) -> MarketplaceResult<bool>;

    /// Fails with `CategoryNotFound` if it is gone.
    async fn update(&self, category: Category) -> MarketplaceResult<Category>;

    async fn delete(&self, id: Uuid) -> MarketplaceResult<bool>;
}

/// The set of registered users, as needed by the notification fan-out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Record or refresh a user seen in an access token.
    async fn upsert(&self, user: MarketUser) -> MarketplaceResult<()>;

    async fn list_ids(&self) -> MarketplaceResult<Vec<Uuid>>;
}
