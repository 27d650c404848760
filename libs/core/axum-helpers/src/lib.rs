//! Shared building blocks for the bazaar HTTP services.
//!
//! - [`auth`]: JWT verification and the [`CurrentUser`] extractor
//! - [`server`]: router assembly, health probes, graceful shutdown
//! - [`http`]: CORS and security headers
//! - [`errors`]: [`AppError`] and the JSON error body
//! - [`extractors`]: UUID path, validated JSON and query extractors
//! - [`audit`]: audit events for write operations

pub mod audit;
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{CurrentUser, JwtAuth, JwtClaims, JwtConfig, optional_jwt_auth_middleware};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    create_router_with_cors, health_router, run_health_checks, shutdown_signal,
};

pub use http::{cors_layer, cors_layer_from_env, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{ApiQuery, UuidPath, ValidatedJson};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
