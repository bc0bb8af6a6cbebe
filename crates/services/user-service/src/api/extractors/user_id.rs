//! Path id extractor.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use common::{AppError, AppResult};

const INVALID_ID: &str = "Request must contain 'id' as a non-negative integer";

/// User id taken from the `{id}` path segment.
///
/// Any non-negative integer is accepted; ids no stored row can carry are
/// resolved by the service as missing users. Everything else is a 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub u64);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("Request doesn't contain 'id'"))?;

        parse_user_id(&raw).map(UserId)
    }
}

/// Parse a user id, rejecting negatives and non-numbers.
pub fn parse_user_id(raw: &str) -> AppResult<u64> {
    raw.parse::<u64>()
        .map_err(|_| AppError::bad_request(INVALID_ID))
}
