//! SeaORM entities for the marketplace tables.

pub mod category;
pub mod item;
pub mod user;
