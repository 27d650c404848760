use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Insert, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use crate::entity::{category, item, user};
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{Category, Item, ItemFilter, MarketUser};
use crate::repository::{CategoryRepository, ItemRepository, UserDirectory};

/// Escape `LIKE` metacharacters so user input only ever matches literally.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// `SELECT` for an [`ItemFilter`], in insertion order.
fn list_query(filter: &ItemFilter) -> Select<item::Entity> {
    let mut query = item::Entity::find();

    if let Some(is_sold) = filter.is_sold {
        query = query.filter(item::Column::IsSold.eq(is_sold));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(item::Column::CategoryId.eq(category_id));
    }
    if let Some(created_by) = filter.created_by {
        query = query.filter(item::Column::CreatedBy.eq(created_by));
    }
    if let Some(exclude_id) = filter.exclude_id {
        query = query.filter(item::Column::Id.ne(exclude_id));
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = like_pattern(search);
        query = query.filter(Expr::cust_with_values(
            r#"(LOWER("items"."name") LIKE ? OR LOWER("items"."description") LIKE ?)"#,
            [pattern.clone(), pattern],
        ));
    }

    query = query
        .order_by_asc(item::Column::CreatedAt)
        .order_by_asc(item::Column::Id);
    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }
    query
}

/// Insert a user, refreshing email and name when the id is already known.
/// `created_at` keeps its first value.
fn upsert_user_query(input: MarketUser) -> Insert<user::ActiveModel> {
    let active: user::ActiveModel = input.into();
    user::Entity::insert(active).on_conflict(
        OnConflict::column(user::Column::Id)
            .update_columns([user::Column::Email, user::Column::Name])
            .to_owned(),
    )
}

pub struct PgItemRepository {
    db: DatabaseConnection,
}

impl PgItemRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn insert(&self, input: Item) -> MarketplaceResult<Item> {
        let active: item::ActiveModel = input.into();
        let model = active.insert(&self.db).await?;

        tracing::info!(item_id = %model.id, "Created item");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Item>> {
        let model = item::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: ItemFilter) -> MarketplaceResult<Vec<Item>> {
        let models = list_query(&filter).all(&self.db).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, input: Item) -> MarketplaceResult<Item> {
        let id = input.id;
        let active: item::ActiveModel = input.into();
        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => MarketplaceError::ItemNotFound(id),
            other => other.into(),
        })?;

        tracing::info!(item_id = %id, "Updated item");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> MarketplaceResult<bool> {
        let result = item::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected > 0 {
            tracing::info!(item_id = %id, "Deleted item");
        }
        Ok(result.rows_affected > 0)
    }

    async fn delete_by_category(&self, category_id: Uuid) -> MarketplaceResult<u64> {
        let result = item::Entity::delete_many()
            .filter(item::Column::CategoryId.eq(category_id))
            .exec(&self.db)
            .await?;
        tracing::info!(%category_id, deleted = result.rows_affected, "Deleted category items");
        Ok(result.rows_affected)
    }
}

pub struct PgCategoryRepository {
    db: DatabaseConnection,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn insert(&self, input: Category) -> MarketplaceResult<Category> {
        let active: category::ActiveModel = input.into();
        let model = active.insert(&self.db).await?;

        tracing::info!(category_id = %model.id, "Created category");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Category>> {
        let model = category::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self) -> MarketplaceResult<Vec<Category>> {
        let models = category::Entity::find()
            .order_by_asc(category::Column::CreatedAt)
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn exists(&self, id: Uuid) -> MarketplaceResult<bool> {
        let count = category::Entity::find_by_id(id).count(&self.db).await?;
        Ok(count > 0)
    }

    async fn update(&self, input: Category) -> MarketplaceResult<Category> {
        let id = input.id;
        let active: category::ActiveModel = input.into();
        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => MarketplaceError::CategoryNotFound(id),
            other => other.into(),
        })?;

        tracing::info!(category_id = %id, "Updated category");
        Ok(model.into())
    }

    /// Items of the category go with it through `ON DELETE CASCADE`.
    async fn delete(&self, id: Uuid) -> MarketplaceResult<bool> {
        let result = category::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected > 0 {
            tracing::info!(category_id = %id, "Deleted category");
        }
        Ok(result.rows_affected > 0)
    }
}

pub struct PgUserDirectory {
    db: DatabaseConnection,
}

impl PgUserDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn upsert(&self, input: MarketUser) -> MarketplaceResult<()> {
        upsert_user_query(input)
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn list_ids(&self) -> MarketplaceResult<Vec<Uuid>> {
        let ids = user::Entity::find()
            .select_only()
            .column(user::Column::Id)
            .order_by_asc(user::Column::CreatedAt)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RELATED_ITEMS_LIMIT;
    use sea_orm::{DbBackend, MockDatabase, QueryTrait, Statement, Transaction, Value};

    fn values(stmt: &Statement) -> Vec<Value> {
        stmt.values.clone().map(|v| v.0).unwrap_or_default()
    }

    fn stored_item(category_id: Uuid) -> Item {
        Item::new(
            crate::models::CreateItem {
                name: "Bike".to_string(),
                description: String::new(),
                price: 10.0,
                image: None,
                category_id,
            },
            Uuid::now_v7(),
        )
    }

    #[test]
    fn catalog_query_combines_sale_status_category_and_search() {
        let category_id = Uuid::now_v7();
        let stmt = list_query(&ItemFilter::catalog(Some("Bi%ke"), Some(category_id)))
            .build(DbBackend::Postgres);

        assert!(stmt.sql.contains(r#""items"."is_sold" = $1"#), "{}", stmt.sql);
        assert!(stmt.sql.contains(r#""items"."category_id" = $2"#), "{}", stmt.sql);
        assert!(stmt.sql.contains(r#"LOWER("items"."name") LIKE "#), "{}", stmt.sql);
        assert!(stmt.sql.contains(r#" OR LOWER("items"."description") LIKE "#), "{}", stmt.sql);
        assert!(
            stmt.sql
                .ends_with(r#"ORDER BY "items"."created_at" ASC, "items"."id" ASC"#),
            "{}",
            stmt.sql
        );
        assert!(!stmt.sql.contains("LIMIT"));

        let pattern = Value::from("%bi\\%ke%".to_string());
        assert_eq!(
            values(&stmt),
            vec![
                Value::from(false),
                Value::from(category_id),
                pattern.clone(),
                pattern
            ]
        );
    }

    #[test]
    fn catalog_query_without_filters_only_hides_sold_items() {
        let stmt = list_query(&ItemFilter::catalog(None, None)).build(DbBackend::Postgres);

        assert!(stmt.sql.contains(r#"WHERE "items"."is_sold" = $1 ORDER BY"#), "{}", stmt.sql);
        assert!(!stmt.sql.contains("LIKE"));
        assert_eq!(values(&stmt), vec![Value::from(false)]);
    }

    #[test]
    fn related_query_excludes_the_item_and_is_capped() {
        let item = stored_item(Uuid::now_v7());
        let stmt = list_query(&ItemFilter::related_to(&item)).build(DbBackend::Postgres);

        assert!(stmt.sql.contains(r#""items"."id" <> $3"#), "{}", stmt.sql);
        assert!(stmt.sql.ends_with("LIMIT $4"), "{}", stmt.sql);
        assert_eq!(
            values(&stmt),
            vec![
                Value::from(false),
                Value::from(item.category_id),
                Value::from(item.id),
                Value::from(RELATED_ITEMS_LIMIT),
            ]
        );
    }

    #[test]
    fn owner_query_includes_sold_items() {
        let owner = Uuid::now_v7();
        let stmt = list_query(&ItemFilter::owned_by(owner)).build(DbBackend::Postgres);

        assert!(!stmt.sql.contains("is_sold"), "{}", stmt.sql);
        assert!(stmt.sql.contains(r#""items"."created_by" = $1"#), "{}", stmt.sql);
        assert_eq!(values(&stmt), vec![Value::from(owner)]);
    }

    #[test]
    fn user_upsert_refreshes_profile_on_conflict() {
        let id = Uuid::now_v7();
        let stmt = upsert_user_query(MarketUser {
            id,
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
        })
        .build(DbBackend::Postgres);

        assert!(stmt.sql.starts_with(r#"INSERT INTO "users" ("id", "email", "name")"#), "{}", stmt.sql);
        assert!(
            stmt.sql.ends_with(
                r#"ON CONFLICT ("id") DO UPDATE SET "email" = "excluded"."email", "name" = "excluded"."name""#
            ),
            "{}",
            stmt.sql
        );
        assert_eq!(
            values(&stmt),
            vec![
                Value::from(id),
                Value::from("ann@example.com".to_string()),
                Value::from("Ann".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn list_runs_the_built_query() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<item::Model>::new()])
            .into_connection();
        let repo = PgItemRepository::new(db);
        let filter = ItemFilter::catalog(Some("lamp"), None);

        let found = repo.list(filter.clone()).await.unwrap();

        assert!(found.is_empty());
        assert_eq!(
            repo.db.into_transaction_log(),
            vec![Transaction::one(list_query(&filter).build(DbBackend::Postgres))]
        );
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("Bike"), "%bike%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
