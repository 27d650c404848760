use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(String),
}

pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

impl MarketplaceError {
    /// Field-level error for a `category_id` that points nowhere.
    pub fn unknown_category(id: Uuid) -> Self {
        let mut error = ValidationError::new("does_not_exist")
            .with_message(format!("Category {id} does not exist").into());
        error.add_param("value".into(), &id.to_string());

        let mut errors = ValidationErrors::new();
        errors.add("category_id", error);
        MarketplaceError::Validation(errors)
    }
}

impl From<MarketplaceError> for AppError {
    fn from(err: MarketplaceError) -> Self {
        match err {
            MarketplaceError::ItemNotFound(id) => AppError::NotFound(format!("Item {id} not found")),
            MarketplaceError::CategoryNotFound(id) => {
                AppError::NotFound(format!("Category {id} not found"))
            }
            MarketplaceError::Validation(errors) => AppError::ValidationError(errors),
            MarketplaceError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for MarketplaceError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl From<sea_orm::DbErr> for MarketplaceError {
    fn from(err: sea_orm::DbErr) -> Self {
        MarketplaceError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn unknown_category_is_a_field_error() {
        let err = MarketplaceError::unknown_category(Uuid::nil());
        let MarketplaceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields = errors.field_errors();
        assert_eq!(fields["category_id"][0].code, "does_not_exist");
    }

    #[test]
    fn status_codes_follow_variant() {
        let cases = [
            (MarketplaceError::ItemNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (MarketplaceError::CategoryNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (MarketplaceError::unknown_category(Uuid::nil()), StatusCode::BAD_REQUEST),
            (MarketplaceError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
