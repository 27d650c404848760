//! HTTP-level middleware shared by every service.

pub mod cors;
pub mod security;

pub use cors::{cors_layer, cors_layer_from_env};
pub use security::security_headers;
