use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Maximum number of related items shown next to an item.
pub const RELATED_ITEMS_LIMIT: u64 = 3;

/// A classified ad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// URL or storage path of the picture, if any
    pub image: Option<String>,
    pub category_id: Uuid,
    pub is_sold: bool,
    /// Seller; fixed at creation
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateItem {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
    pub category_id: Uuid,
}

/// Partial update of an item. Absent fields are left alone; an empty
/// `image` clears the picture.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateItem {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
    pub category_id: Option<Uuid>,
}

impl Item {
    pub fn new(input: CreateItem, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            price: input.price,
            image: input.image.filter(|image| !image.is_empty()),
            category_id: input.category_id,
            is_sold: false,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: UpdateItem) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(image) = update.image {
            self.image = (!image.is_empty()).then_some(image);
        }
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        self.updated_at = Utc::now();
    }

    pub fn mark_sold(&mut self) {
        self.is_sold = true;
        self.updated_at = Utc::now();
    }
}

/// An item together with unsold items from the same category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub related: Vec<Item>,
}

/// Query string accepted by the item listing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemQuery {
    /// Case-insensitive match against name or description
    pub query: Option<String>,
    /// Category id; empty, `0` and the nil UUID mean "any category"
    pub category: Option<String>,
}

impl ItemQuery {
    pub fn search(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }

    pub fn category_id(&self) -> Result<Option<Uuid>, uuid::Error> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") | Some("0") => Ok(None),
            Some(raw) => {
                let id = Uuid::parse_str(raw)?;
                Ok((!id.is_nil()).then_some(id))
            }
        }
    }
}

/// Storage-level selection of items, shared by every repository backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    pub is_sold: Option<bool>,
    pub category_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub search: Option<String>,
    pub exclude_id: Option<Uuid>,
    pub limit: Option<u64>,
}

impl ItemFilter {
    /// Public catalog: unsold items only.
    pub fn catalog(search: Option<&str>, category_id: Option<Uuid>) -> Self {
        Self {
            is_sold: Some(false),
            category_id,
            search: search.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn related_to(item: &Item) -> Self {
        Self {
            is_sold: Some(false),
            category_id: Some(item.category_id),
            exclude_id: Some(item.id),
            limit: Some(RELATED_ITEMS_LIMIT),
            ..Self::default()
        }
    }

    pub fn owned_by(user_id: Uuid) -> Self {
        Self {
            created_by: Some(user_id),
            ..Self::default()
        }
    }

    /// Predicate form of the filter. `limit` is not considered here.
    pub fn matches(&self, item: &Item) -> bool {
        if self.is_sold.is_some_and(|sold| item.is_sold != sold) {
            return false;
        }
        if self.category_id.is_some_and(|id| item.category_id != id) {
            return false;
        }
        if self.created_by.is_some_and(|id| item.created_by != id) {
            return false;
        }
        if self.exclude_id == Some(item.id) {
            return false;
        }
        match &self.search {
            Some(needle) => {
                let needle = needle.to_lowercase();
                item.name.to_lowercase().contains(&needle)
                    || item.description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Rename a category; an absent name changes nothing.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

impl Category {
    pub fn new(input: CreateCategory) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            created_at: Utc::now(),
        }
    }

    pub fn apply_update(&mut self, update: UpdateCategory) {
        if let Some(name) = update.name {
            self.name = name;
        }
    }
}

/// A user as known to the marketplace, mirrored from token claims.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}
