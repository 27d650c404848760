pub use sea_orm_migration::prelude::*;

mod m20260301_000000_bootstrap;
mod m20260301_000001_create_users;
mod m20260301_000002_create_categories;
mod m20260301_000003_create_items;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000000_bootstrap::Migration),
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_categories::Migration),
            Box::new(m20260301_000003_create_items::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_registered_in_dependency_order() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "m20260301_000000_bootstrap",
                "m20260301_000001_create_users",
                "m20260301_000002_create_categories",
                "m20260301_000003_create_items",
            ]
        );
    }
}
