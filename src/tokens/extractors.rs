use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{error::ApiError, state::AppState, tokens::repo::AuthToken, users::User};

pub const NOT_PROVIDED: &str = "Authentication credentials were not provided.";
pub const INVALID_TOKEN: &str = "Invalid token.";

/// Resolves `Authorization: Token <key>` to the owning, active user.
pub struct TokenUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for TokenUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized(NOT_PROVIDED))?;

        let mut pieces = header.split_whitespace();
        match pieces.next() {
            Some(scheme) if scheme.eq_ignore_ascii_case("token") => {}
            _ => return Err(ApiError::Unauthorized(NOT_PROVIDED)),
        }
        let key = pieces
            .next()
            .ok_or(ApiError::Unauthorized("Invalid token header. No credentials provided."))?;
        if pieces.next().is_some() {
            return Err(ApiError::Unauthorized(
                "Invalid token header. Token string should not contain spaces.",
            ));
        }

        let Some(token) = AuthToken::find(&state.db, key).await? else {
            warn!("unknown api token");
            return Err(ApiError::Unauthorized(INVALID_TOKEN));
        };

        let user = User::find_by_id(&state.db, token.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ApiError::Unauthorized("User inactive or deleted."))?;

        Ok(TokenUser(user))
    }
}
