use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    error::{ApiError, FieldErrors, NON_FIELD_ERRORS},
    state::AppState,
    tokens::repo::AuthToken,
    users::{
        services::authenticate,
        validation::{BLANK, REQUIRED},
    },
};

pub const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub fn token_routes() -> Router<AppState> {
    Router::new().route("/user/token", post(obtain_token))
}

#[instrument(skip(state, payload))]
pub async fn obtain_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(payload) = payload?;

    let mut errors = FieldErrors::new();
    let email = required(&mut errors, "email", payload.email.as_deref().map(str::trim));
    // Passwords are compared as sent, whitespace included.
    let password = required(&mut errors, "password", payload.password.as_deref());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::Validation(errors));
    };

    let Some(user) = authenticate(&state.db, email, password).await? else {
        warn!(email = %email, "token request with bad credentials");
        return Err(ApiError::field(NON_FIELD_ERRORS, BAD_CREDENTIALS));
    };

    let token = AuthToken::get_or_create(&state.db, user.id).await?;
    info!(user_id = user.id, "api token issued");
    Ok(Json(TokenResponse { token: token.token }))
}

fn required<'a>(errors: &mut FieldErrors, field: &str, value: Option<&'a str>) -> Option<&'a str> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, BLANK);
            None
        }
        Some(value) => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_report_missing_and_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(required(&mut errors, "email", None), None);
        assert_eq!(required(&mut errors, "password", Some("")), None);
        assert_eq!(errors.get("email"), [REQUIRED.to_string()]);
        assert_eq!(errors.get("password"), [BLANK.to_string()]);

        let mut errors = FieldErrors::new();
        assert_eq!(required(&mut errors, "email", Some("a@b.c")), Some("a@b.c"));
        assert!(errors.is_empty());
    }
}
