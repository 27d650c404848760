//! In-process repositories for tests and database-less local runs.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{Category, Item, ItemFilter, MarketUser};
use crate::repository::{CategoryRepository, ItemRepository, UserDirectory};

#[derive(Default)]
pub struct InMemoryItemRepository {
    items: RwLock<Vec<Item>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn insert(&self, item: Item) -> MarketplaceResult<Item> {
        self.items.write().await.push(item.clone());
        Ok(item)
    }

    async fn get_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Item>> {
        Ok(self.items.read().await.iter().find(|i| i.id == id).cloned())
    }

    async fn list(&self, filter: ItemFilter) -> MarketplaceResult<Vec<Item>> {
        let items = self.items.read().await;
        let mut found: Vec<Item> = items.iter().filter(|i| filter.matches(i)).cloned().collect();
        found.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        if let Some(limit) = filter.limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn update(&self, item: Item) -> MarketplaceResult<Item> {
        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or(MarketplaceError::ItemNotFound(item.id))?;
        *slot = item.clone();
        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> MarketplaceResult<bool> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() < before)
    }

    async fn delete_by_category(&self, category_id: Uuid) -> MarketplaceResult<u64> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.category_id != category_id);
        Ok((before - items.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    categories: RwLock<Vec<Category>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn insert(&self, category: Category) -> MarketplaceResult<Category> {
        self.categories.write().await.push(category.clone());
        Ok(category)
    }

    async fn get_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Category>> {
        Ok(self
            .categories
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list(&self) -> MarketplaceResult<Vec<Category>> {
        Ok(self.categories.read().await.clone())
    }

    async fn exists(&self, id: Uuid) -> MarketplaceResult<bool> {
        Ok(self.categories.read().await.iter().any(|c| c.id == id))
    }

    async fn update(&self, category: Category) -> MarketplaceResult<Category> {
        let mut categories = self.categories.write().await;
        let slot = categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or(MarketplaceError::CategoryNotFound(category.id))?;
        *slot = category.clone();
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> MarketplaceResult<bool> {
        let mut categories = self.categories.write().await;
        let before = categories.len();
        categories.retain(|c| c.id != id);
        Ok(categories.len() < before)
    }
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<MarketUser>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn upsert(&self, user: MarketUser) -> MarketplaceResult<()> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
        Ok(())
    }

    async fn list_ids(&self) -> MarketplaceResult<Vec<Uuid>> {
        Ok(self.users.read().await.iter().map(|u| u.id).collect())
    }
}
