//! Read side of the marketplace. Public, side-effect free.

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{Item, ItemDetail, ItemFilter};
use crate::repository::ItemRepository;

#[derive(Clone)]
pub struct CatalogService {
    items: Arc<dyn ItemRepository>,
}

impl CatalogService {
    pub fn new(items: Arc<dyn ItemRepository>) -> Self {
        Self { items }
    }

    /// Unsold items, optionally narrowed by category and a free-text match.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        search: Option<&str>,
        category_id: Option<Uuid>,
    ) -> MarketplaceResult<Vec<Item>> {
        let search = search.filter(|s| !s.is_empty());
        self.items.list(ItemFilter::catalog(search, category_id)).await
    }

    /// An item (sold or not) and up to three unsold items from its category.
    #[instrument(skip(self))]
    pub async fn detail(&self, id: Uuid) -> MarketplaceResult<ItemDetail> {
        let item = self
            .items
            .get_by_id(id)
            .await?
            .ok_or(MarketplaceError::ItemNotFound(id))?;
        let related = self.items.list(ItemFilter::related_to(&item)).await?;

        Ok(ItemDetail { item, related })
    }
}
