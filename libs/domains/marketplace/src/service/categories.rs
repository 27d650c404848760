use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{Category, CreateCategory, UpdateCategory};
use crate::repository::{CategoryRepository, ItemRepository};

/// Category management. Deleting a category takes its items with it.
#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    items: Arc<dyn ItemRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>, items: Arc<dyn ItemRepository>) -> Self {
        Self { categories, items }
    }

    pub async fn list(&self) -> MarketplaceResult<Vec<Category>> {
        self.categories.list().await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> MarketplaceResult<Category> {
        self.categories
            .get_by_id(id)
            .await?
            .ok_or(MarketplaceError::CategoryNotFound(id))
    }

    #[instrument(skip(self, input), fields(category_name = %input.name))]
    pub async fn create(&self, input: CreateCategory) -> MarketplaceResult<Category> {
        input.validate()?;
        self.categories.insert(Category::new(input)).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateCategory) -> MarketplaceResult<Category> {
        let mut category = self.get(id).await?;
        input.validate()?;
        category.apply_update(input);
        self.categories.update(category).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> MarketplaceResult<()> {
        if !self.categories.exists(id).await? {
            return Err(MarketplaceError::CategoryNotFound(id));
        }

        let removed = self.items.delete_by_category(id).await?;
        debug!(category_id = %id, removed, "Removed items of category");

        if !self.categories.delete(id).await? {
            return Err(MarketplaceError::CategoryNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockCategoryRepository, MockItemRepository};

    fn category_service(
        categories: MockCategoryRepository,
        items: MockItemRepository,
    ) -> CategoryService {
        CategoryService::new(Arc::new(categories), Arc::new(items))
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_insert().never();

        let service = category_service(repo, MockItemRepository::new());
        let err = service
            .create(CreateCategory {
                name: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::Validation(_)));
    }

    #[tokio::test]
    async fn get_missing_category_is_not_found() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));

        let service = category_service(repo, MockItemRepository::new());
        let err = service.get(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_items_before_the_category() {
        let id = Uuid::now_v7();
        let mut seq = mockall::Sequence::new();
        let mut categories = MockCategoryRepository::new();
        let mut items = MockItemRepository::new();

        categories
            .expect_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        items
            .expect_delete_by_category()
            .withf(move |category_id| *category_id == id)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(2));
        categories
            .expect_delete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        category_service(categories, items).delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn delete_missing_category_touches_no_items() {
        let mut categories = MockCategoryRepository::new();
        categories.expect_exists().returning(|_| Ok(false));
        categories.expect_delete().never();
        let mut items = MockItemRepository::new();
        items.expect_delete_by_category().never();

        let err = category_service(categories, items)
            .delete(Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn update_rejects_blank_name_and_keeps_category() {
        let existing = Category::new(CreateCategory {
            name: "Bikes".to_string(),
        });
        let id = existing.id;
        let mut categories = MockCategoryRepository::new();
        categories
            .expect_get_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        categories.expect_update().never();

        let err = category_service(categories, MockItemRepository::new())
            .update(
                id,
                UpdateCategory {
                    name: Some(String::new()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::Validation(_)));
    }
}
