mod catalog;
mod categories;
mod lifecycle;

pub use catalog::CatalogService;
pub use categories::CategoryService;
pub use lifecycle::ItemLifecycleService;
