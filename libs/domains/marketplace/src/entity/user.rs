use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

/// Read-mostly mirror of token identities; rows are upserted on first write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<crate::models::MarketUser> for ActiveModel {
    fn from(user: crate::models::MarketUser) -> Self {
        ActiveModel {
            id: Set(user.id),
            email: Set(user.email),
            name: Set(user.name),
            created_at: NotSet,
        }
    }
}
