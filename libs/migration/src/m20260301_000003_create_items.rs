use sea_orm_migration::{prelude::*, schema::*};

use crate::m20260301_000001_create_users::Users;
use crate::m20260301_000002_create_categories::Categories;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(pk_uuid(Items::Id))
                    .col(string_len(Items::Name, 255))
                    .col(text(Items::Description).default(""))
                    .col(double(Items::Price))
                    .col(ColumnDef::new(Items::Image).string_len(2048).null())
                    .col(uuid(Items::CategoryId))
                    .col(uuid(Items::CreatedBy))
                    .col(boolean(Items::IsSold).default(false))
                    .col(
                        timestamp_with_time_zone(Items::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Items::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_category_id")
                            .from(Items::Table, Items::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_created_by")
                            .from(Items::Table, Items::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_items_category_id", Items::CategoryId),
            ("idx_items_created_by", Items::CreatedBy),
            ("idx_items_is_sold", Items::IsSold),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Items::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER items_touch_updated_at
                    BEFORE UPDATE ON items
                    FOR EACH ROW
                    EXECUTE FUNCTION util.touch_updated_at()
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS items_touch_updated_at ON items")
            .await?;

        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    Name,
    Description,
    Price,
    Image,
    CategoryId,
    CreatedBy,
    IsSold,
    CreatedAt,
    UpdatedAt,
}
