use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller. Authentication itself happens upstream; the
/// gateway verifies credentials and injects the user id header, and this
/// extractor only requires its presence.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|id| AuthUser { id: id.to_string() })
            .ok_or(AppError::Unauthorized)
    }
}
