use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::{ApiError, FieldErrors},
    state::AppState,
    tokens::extractors::TokenUser,
    users::{
        dto::{UserPayload, UserResponse},
        repo_types::User,
        services::{self, ProfileUpdate},
        validation::{check_email, check_name, check_password, EMAIL_TAKEN},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user/create", post(create_user))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route(
        "/user/me",
        get(get_me).put(replace_me).patch(update_me),
    )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(payload) = payload?;

    let mut errors = FieldErrors::new();
    let email = check_email(&mut errors, "email", payload.email.as_deref());
    let password = check_password(&mut errors, "password", payload.password.as_deref());
    let name = check_name(&mut errors, "name", payload.name.as_deref());

    if let Some(email) = &email {
        if User::email_taken(&state.db, email, None).await? {
            errors.add("email", EMAIL_TAKEN);
        }
    }
    let (Some(email), Some(password), true) = (email, password, errors.is_empty()) else {
        warn!(fields = ?errors, "user create rejected");
        return Err(ApiError::Validation(errors));
    };

    let user = services::create_user(&state.db, &email, password, &name).await?;
    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(user), fields(user_id = user.id))]
pub async fn get_me(TokenUser(user): TokenUser) -> Json<UserResponse> {
    Json(user.into())
}

/// `PUT /user/me`: email and password must both be present.
#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn replace_me(
    State(state): State<AppState>,
    TokenUser(user): TokenUser,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(payload) = payload?;
    save_profile(&state, &user, payload, false).await
}

/// `PATCH /user/me`: only the fields present are touched.
#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    TokenUser(user): TokenUser,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(payload) = payload?;
    save_profile(&state, &user, payload, true).await
}

async fn save_profile(
    state: &AppState,
    user: &User,
    payload: UserPayload,
    partial: bool,
) -> Result<Json<UserResponse>, ApiError> {
    let mut errors = FieldErrors::new();

    let email = match (&payload.email, partial) {
        (None, true) => None,
        (email, _) => check_email(&mut errors, "email", email.as_deref()),
    };
    let password = match (&payload.password, partial) {
        (None, true) => None,
        (password, _) => check_password(&mut errors, "password", password.as_deref()),
    };
    let name = payload
        .name
        .as_deref()
        .map(|name| check_name(&mut errors, "name", Some(name)));

    errors.into_result()?;

    let updated = services::update_profile(
        &state.db,
        user,
        ProfileUpdate {
            email,
            name,
            password,
        },
    )
    .await?;
    Ok(Json(updated.into()))
}
