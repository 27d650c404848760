//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs issued by the identity service; this crate only
//! verifies them. [`optional_jwt_auth_middleware`] attaches [`JwtClaims`] to
//! requests that carry a valid token, and handlers that need a signed-in
//! caller take a [`CurrentUser`] argument.
//!
//! ```ignore
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//! let app = Router::new()
//!     .route("/items", post(create_item))
//!     .layer(axum::middleware::from_fn_with_state(auth, optional_jwt_auth_middleware));
//! ```

pub mod config;
pub mod current_user;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use current_user::CurrentUser;
pub use jwt::{AuthError, JwtAuth, JwtClaims};
pub use middleware::{extract_token_from_headers, optional_jwt_auth_middleware};
