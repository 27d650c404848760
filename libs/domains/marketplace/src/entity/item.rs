use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    pub image: Option<String>,
    pub category_id: Uuid,
    pub created_by: Uuid,
    pub is_sold: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::Item {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            image: model.image,
            category_id: model.category_id,
            is_sold: model.is_sold,
            created_by: model.created_by,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<crate::models::Item> for ActiveModel {
    fn from(item: crate::models::Item) -> Self {
        ActiveModel {
            id: Set(item.id),
            name: Set(item.name),
            description: Set(item.description),
            price: Set(item.price),
            image: Set(item.image),
            category_id: Set(item.category_id),
            created_by: Set(item.created_by),
            is_sold: Set(item.is_sold),
            created_at: Set(item.created_at.into()),
            updated_at: Set(item.updated_at.into()),
        }
    }
}
