use super::jwt::JwtClaims;
use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// The authenticated caller. Rejects with 401 when the request is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl TryFrom<&JwtClaims> for CurrentUser {
    type Error = AppError;

    fn try_from(claims: &JwtClaims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Token subject is not a user id".to_string()))?;
        Ok(Self {
            id,
            email: claims.email.clone(),
            name: claims.name.clone(),
        })
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<JwtClaims>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
        CurrentUser::try_from(claims)
    }
}
