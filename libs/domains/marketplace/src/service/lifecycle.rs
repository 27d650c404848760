//! Write side of the marketplace.
//!
//! Every operation acts on behalf of an authenticated [`CurrentUser`].
//! Edits and deletes are restricted to the seller; for anyone else the item
//! does not exist.

use std::collections::HashSet;
use std::sync::Arc;

use axum_helpers::CurrentUser;
use domain_notifications::{NewItemNotification, NotificationDispatcher};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::models::{CreateItem, Item, ItemFilter, MarketUser, UpdateItem};
use crate::repository::{CategoryRepository, ItemRepository, UserDirectory};

#[derive(Clone)]
pub struct ItemLifecycleService {
    items: Arc<dyn ItemRepository>,
    categories: Arc<dyn CategoryRepository>,
    users: Arc<dyn UserDirectory>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    /// Callers already written to the user directory by this process
    registered: Arc<RwLock<HashSet<Uuid>>>,
}

impl ItemLifecycleService {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        categories: Arc<dyn CategoryRepository>,
        users: Arc<dyn UserDirectory>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            items,
            categories,
            users,
            dispatcher,
            registered: Arc::default(),
        }
    }

    /// Make `user` a recipient of future new-item announcements.
    ///
    /// The directory is written once per user and process; a failed write is
    /// retried on the next call.
    pub async fn register(&self, user: &CurrentUser) -> MarketplaceResult<()> {
        if self.registered.read().await.contains(&user.id) {
            return Ok(());
        }

        self.users
            .upsert(MarketUser {
                id: user.id,
                email: user.email.clone(),
                name: user.name.clone(),
            })
            .await?;
        self.registered.write().await.insert(user.id);
        debug!(user_id = %user.id, "Registered user");
        Ok(())
    }

    /// List a new item for `user` and announce it to every registered user.
    #[instrument(skip(self, user, input), fields(user_id = %user.id, item_name = %input.name))]
    pub async fn create(&self, user: &CurrentUser, input: CreateItem) -> MarketplaceResult<Item> {
        input.validate()?;
        self.ensure_category(input.category_id).await?;

        self.register(user).await?;

        let item = self.items.insert(Item::new(input, user.id)).await?;
        self.announce(&item).await;
        Ok(item)
    }

    #[instrument(skip(self, user, input), fields(user_id = %user.id))]
    pub async fn edit(
        &self,
        user: &CurrentUser,
        id: Uuid,
        input: UpdateItem,
    ) -> MarketplaceResult<Item> {
        let mut item = self.owned_item(user, id).await?;

        input.validate()?;
        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        item.apply_update(input);
        self.items.update(item).await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &CurrentUser, id: Uuid) -> MarketplaceResult<()> {
        self.owned_item(user, id).await?;
        if !self.items.delete(id).await? {
            return Err(MarketplaceError::ItemNotFound(id));
        }
        Ok(())
    }

    /// Open to any authenticated user. Marking a sold item again is a no-op.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn mark_as_sold(&self, user: &CurrentUser, id: Uuid) -> MarketplaceResult<Item> {
        let mut item = self
            .items
            .get_by_id(id)
            .await?
            .ok_or(MarketplaceError::ItemNotFound(id))?;

        if item.is_sold {
            return Ok(item);
        }
        item.mark_sold();
        self.items.update(item).await
    }

    /// Everything `user` has listed, sold or not.
    pub async fn list_mine(&self, user: &CurrentUser) -> MarketplaceResult<Vec<Item>> {
        self.items.list(ItemFilter::owned_by(user.id)).await
    }

    async fn owned_item(&self, user: &CurrentUser, id: Uuid) -> MarketplaceResult<Item> {
        let item = self
            .items
            .get_by_id(id)
            .await?
            .ok_or(MarketplaceError::ItemNotFound(id))?;

        if item.created_by != user.id {
            debug!(item_id = %id, owner = %item.created_by, "Caller does not own item");
            return Err(MarketplaceError::ItemNotFound(id));
        }
        Ok(item)
    }

    async fn ensure_category(&self, category_id: Uuid) -> MarketplaceResult<()> {
        if self.categories.exists(category_id).await? {
            Ok(())
        } else {
            Err(MarketplaceError::unknown_category(category_id))
        }
    }

    /// One notification per registered user. Never fails the caller.
    async fn announce(&self, item: &Item) {
        let recipients = match self.users.list_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "Could not list users, skipping notifications");
                return;
            }
        };

        debug!(item_id = %item.id, recipients = recipients.len(), "Announcing new item");
        for recipient_id in recipients {
            self.dispatcher.notify_new_item(NewItemNotification::new(
                recipient_id,
                item.id,
                item.name.clone(),
                item.created_by,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockCategoryRepository, MockItemRepository, MockUserDirectory};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDispatcher {
        sent: Mutex<Vec<NewItemNotification>>,
    }

    impl NotificationDispatcher for RecordingDispatcher {
        fn notify_new_item(&self, notification: NewItemNotification) {
            self.sent.lock().unwrap().push(notification);
        }
    }

    fn user() -> CurrentUser {
        CurrentUser {
            id: Uuid::now_v7(),
            email: "seller@example.com".to_string(),
            name: "Seller".to_string(),
        }
    }

    fn create_input(category_id: Uuid) -> CreateItem {
        CreateItem {
            name: "Bike".to_string(),
            description: "Two wheels".to_string(),
            price: 150.0,
            image: None,
            category_id,
        }
    }

    fn categories_all_exist() -> MockCategoryRepository {
        let mut categories = MockCategoryRepository::new();
        categories.expect_exists().returning(|_| Ok(true));
        categories
    }

    fn service(
        items: MockItemRepository,
        categories: MockCategoryRepository,
        users: MockUserDirectory,
        dispatcher: Arc<RecordingDispatcher>,
    ) -> ItemLifecycleService {
        ItemLifecycleService::new(
            Arc::new(items),
            Arc::new(categories),
            Arc::new(users),
            dispatcher,
        )
    }

    #[tokio::test]
    async fn create_notifies_each_user_with_their_own_id() {
        let seller = user();
        let recipients = vec![seller.id, Uuid::now_v7(), Uuid::now_v7()];

        let mut items = MockItemRepository::new();
        items.expect_insert().times(1).returning(Ok);
        let mut users = MockUserDirectory::new();
        users.expect_upsert().times(1).returning(|_| Ok(()));
        let ids = recipients.clone();
        users.expect_list_ids().returning(move || Ok(ids.clone()));
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let service = service(items, categories_all_exist(), users, dispatcher.clone());
        let item = service
            .create(&seller, create_input(Uuid::now_v7()))
            .await
            .unwrap();

        assert_eq!(item.created_by, seller.id);
        assert!(!item.is_sold);

        let sent = dispatcher.sent.lock().unwrap();
        assert_eq!(
            sent.iter().map(|n| n.recipient_id).collect::<Vec<_>>(),
            recipients
        );
        assert!(sent.iter().all(|n| n.item_id == item.id && n.item_name == "Bike"));
        assert!(sent.iter().all(|n| n.created_by == seller.id));
    }

    #[tokio::test]
    async fn register_writes_each_user_once() {
        let mut users = MockUserDirectory::new();
        users.expect_upsert().times(1).returning(|_| Ok(()));
        let service = service(
            MockItemRepository::new(),
            MockCategoryRepository::new(),
            users,
            Arc::new(RecordingDispatcher::default()),
        );

        let buyer = user();
        service.register(&buyer).await.unwrap();
        service.register(&buyer).await.unwrap();
    }

    #[tokio::test]
    async fn failed_registration_is_retried() {
        let mut seq = mockall::Sequence::new();
        let mut users = MockUserDirectory::new();
        users
            .expect_upsert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(MarketplaceError::Database("connection reset".into())));
        users
            .expect_upsert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let service = service(
            MockItemRepository::new(),
            MockCategoryRepository::new(),
            users,
            Arc::new(RecordingDispatcher::default()),
        );

        let buyer = user();
        assert!(service.register(&buyer).await.is_err());
        service.register(&buyer).await.unwrap();
    }

    #[tokio::test]
    async fn create_succeeds_when_users_cannot_be_listed() {
        let mut items = MockItemRepository::new();
        items.expect_insert().returning(Ok);
        let mut users = MockUserDirectory::new();
        users.expect_upsert().returning(|_| Ok(()));
        users
            .expect_list_ids()
            .returning(|| Err(MarketplaceError::Database("connection reset".into())));
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let service = service(items, categories_all_exist(), users, dispatcher.clone());
        service
            .create(&user(), create_input(Uuid::now_v7()))
            .await
            .unwrap();

        assert!(dispatcher.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_with_invalid_fields_persists_nothing() {
        let mut items = MockItemRepository::new();
        items.expect_insert().never();
        let mut categories = MockCategoryRepository::new();
        categories.expect_exists().never();
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let service = service(items, categories, MockUserDirectory::new(), dispatcher.clone());
        let mut input = create_input(Uuid::now_v7());
        input.name = String::new();
        input.price = -1.0;

        let err = service.create(&user(), input).await.unwrap_err();
        let MarketplaceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("price"));
        assert!(dispatcher.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_with_unknown_category_is_a_validation_error() {
        let mut items = MockItemRepository::new();
        items.expect_insert().never();
        let mut categories = MockCategoryRepository::new();
        categories.expect_exists().returning(|_| Ok(false));

        let service = service(
            items,
            categories,
            MockUserDirectory::new(),
            Arc::new(RecordingDispatcher::default()),
        );
        let err = service
            .create(&user(), create_input(Uuid::now_v7()))
            .await
            .unwrap_err();

        assert!(matches!(err, MarketplaceError::Validation(_)));
    }

    #[tokio::test]
    async fn foreign_item_looks_missing_to_edit_and_delete() {
        let owner = user();
        let stranger = user();
        let stored = Item::new(create_input(Uuid::now_v7()), owner.id);
        let id = stored.id;

        let mut items = MockItemRepository::new();
        items
            .expect_get_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        items.expect_update().never();
        items.expect_delete().never();

        let service = service(
            items,
            categories_all_exist(),
            MockUserDirectory::new(),
            Arc::new(RecordingDispatcher::default()),
        );

        let edit = service
            .edit(&stranger, id, UpdateItem::default())
            .await
            .unwrap_err();
        assert!(matches!(edit, MarketplaceError::ItemNotFound(found) if found == id));

        let delete = service.delete(&stranger, id).await.unwrap_err();
        assert!(matches!(delete, MarketplaceError::ItemNotFound(found) if found == id));
    }

    #[tokio::test]
    async fn owner_edit_keeps_seller_and_sale_state() {
        let owner = user();
        let stored = Item::new(create_input(Uuid::now_v7()), owner.id);
        let id = stored.id;

        let mut items = MockItemRepository::new();
        items
            .expect_get_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        items.expect_update().times(1).returning(Ok);

        let service = service(
            items,
            categories_all_exist(),
            MockUserDirectory::new(),
            Arc::new(RecordingDispatcher::default()),
        );
        let edited = service
            .edit(
                &owner,
                id,
                UpdateItem {
                    name: Some("Road Bike".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.name, "Road Bike");
        assert_eq!(edited.created_by, owner.id);
        assert!(!edited.is_sold);
    }

    #[tokio::test]
    async fn mark_as_sold_twice_writes_once() {
        let seller = user();
        let buyer = user();
        let mut sold = Item::new(create_input(Uuid::now_v7()), seller.id);
        sold.mark_sold();
        let id = sold.id;

        let mut items = MockItemRepository::new();
        items
            .expect_get_by_id()
            .returning(move |_| Ok(Some(sold.clone())));
        items.expect_update().never();

        let service = service(
            items,
            categories_all_exist(),
            MockUserDirectory::new(),
            Arc::new(RecordingDispatcher::default()),
        );
        let item = service.mark_as_sold(&buyer, id).await.unwrap();
        assert!(item.is_sold);
    }

    #[tokio::test]
    async fn mark_as_sold_of_missing_item_is_not_found() {
        let mut items = MockItemRepository::new();
        items.expect_get_by_id().returning(|_| Ok(None));

        let service = service(
            items,
            categories_all_exist(),
            MockUserDirectory::new(),
            Arc::new(RecordingDispatcher::default()),
        );
        let err = service
            .mark_as_sold(&user(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::ItemNotFound(_)));
    }
}
