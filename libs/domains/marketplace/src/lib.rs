//! Marketplace Domain
//!
//! Classified ads: a public catalog of unsold items, seller-owned item
//! lifecycle, and a "new item" announcement to every registered user.
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  ← /items, /categories
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │   Services   │  ← catalog (read), lifecycle (write), categories
//! └──────┬───────┘
//!        │                  ┌────────────────────────┐
//!        ├─────────────────►│ NotificationDispatcher │  (fire-and-forget)
//!        │                  └────────────────────────┘
//! ┌──────▼───────┐
//! │ Repositories │  ← traits + PostgreSQL / in-memory implementations
//! └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let items = Arc::new(PgItemRepository::new(db.clone()));
//! let categories = Arc::new(PgCategoryRepository::new(db.clone()));
//! let users = Arc::new(PgUserDirectory::new(db));
//!
//! let state = MarketplaceState {
//!     catalog: CatalogService::new(items.clone()),
//!     lifecycle: ItemLifecycleService::new(items.clone(), categories.clone(), users, dispatcher),
//!     categories: CategoryService::new(categories, items),
//! };
//! let router = handlers::router(state);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{MarketplaceError, MarketplaceResult};
pub use handlers::{CategoriesApiDoc, ItemsApiDoc, MarketplaceState};
pub use memory::{InMemoryCategoryRepository, InMemoryItemRepository, InMemoryUserDirectory};
pub use models::{
    Category, CreateCategory, CreateItem, Item, ItemDetail, ItemFilter, ItemQuery, MarketUser,
    RELATED_ITEMS_LIMIT, UpdateCategory, UpdateItem,
};
pub use postgres::{PgCategoryRepository, PgItemRepository, PgUserDirectory};
pub use repository::{CategoryRepository, ItemRepository, UserDirectory};
pub use service::{CatalogService, CategoryService, ItemLifecycleService};
