use axum::{
    extract::{FromRef, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    admin::{
        forms::{AddUserForm, ChangeUserForm, LoginForm, NextQuery},
        render::{self, change_path, ChangeValues, CHANGELIST_PATH},
        session::{current_staff, found, safe_next, SessionKeys, StaffUser, LOGIN_PATH},
    },
    error::{ApiError, FieldErrors},
    state::AppState,
    tokens::AuthToken,
    users::{
        repo_types::UserChanges,
        services::{self, authenticate, unique_to_field},
        validation::{check_email, check_name, check_password, EMAIL_TAKEN, REQUIRED},
        User,
    },
};

pub const BAD_LOGIN: &str = "Please enter the correct email and password for a staff account. \
Note that both fields may be case-sensitive.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(index))
        .route("/admin/", get(index))
        .route("/admin/login/", get(login_page).post(login))
        .route("/admin/logout/", post(logout))
        .route("/admin/core/user/", get(changelist))
        .route("/admin/core/user/add/", get(add_page).post(add_user))
        .route("/admin/core/user/:id/change/", get(change_page).post(change_user))
        .route("/admin/core/user/:id/delete/", get(delete_page).post(delete_user))
}

/// Blank form input counts as missing.
fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

async fn index(StaffUser(_): StaffUser) -> Response {
    found(CHANGELIST_PATH)
}

#[instrument(skip(state, headers))]
async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NextQuery>,
) -> Result<Response, ApiError> {
    let next = safe_next(query.next.as_deref());
    if current_staff(&state, &headers).await?.is_some() {
        return Ok(found(next.unwrap_or(CHANGELIST_PATH)));
    }
    Ok(Html(render::login_page(next, "", None)).into_response())
}

#[instrument(skip(state, form), fields(email = %form.email))]
async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response, ApiError> {
    let next = safe_next(form.next.as_deref());
    let email = form.email.trim();

    let staff = authenticate(&state.db, email, &form.password)
        .await?
        .filter(|u| u.is_staff);
    let Some(user) = staff else {
        warn!("admin sign-in refused");
        return Ok(Html(render::login_page(next, email, Some(BAD_LOGIN))).into_response());
    };

    User::touch_last_login(&state.db, user.id).await?;
    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let cookie = HeaderValue::from_str(&keys.cookie(&token)).map_err(anyhow::Error::from)?;

    info!(user_id = user.id, "admin signed in");
    let mut response = found(next.unwrap_or(CHANGELIST_PATH));
    response.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(response)
}

async fn logout(State(state): State<AppState>) -> Result<Response, ApiError> {
    let keys = SessionKeys::from_ref(&state);
    let cookie = HeaderValue::from_str(&keys.clear_cookie()).map_err(anyhow::Error::from)?;
    let mut response = found(LOGIN_PATH);
    response.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(response)
}

#[instrument(skip_all, fields(staff_id = staff.id))]
async fn changelist(State(state): State<AppState>, StaffUser(staff): StaffUser) -> Result<Html<String>, ApiError> {
    let users = User::list(&state.db).await?;
    Ok(Html(render::changelist(&staff, &users)))
}

async fn add_page(StaffUser(staff): StaffUser) -> Html<String> {
    Html(render::add_form(&staff, "", &FieldErrors::new()))
}

#[instrument(skip_all, fields(staff_id = staff.id))]
async fn add_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Form(form): Form<AddUserForm>,
) -> Result<Response, ApiError> {
    let mut errors = FieldErrors::new();
    let email = check_email(&mut errors, "email", non_empty(&form.email));
    let password = check_password(&mut errors, "password1", non_empty(&form.password1));
    if non_empty(&form.password2).is_none() {
        errors.add("password2", REQUIRED);
    } else if password.is_some() && form.password1 != form.password2 {
        errors.add("password2", PASSWORD_MISMATCH);
    }
    if let Some(email) = &email {
        if User::email_taken(&state.db, email, None).await? {
            errors.add("email", EMAIL_TAKEN);
        }
    }

    let (Some(email), Some(password), true) = (email, password, errors.is_empty()) else {
        return Ok(Html(render::add_form(&staff, &form.email, &errors)).into_response());
    };

    match services::create_user(&state.db, &email, password, "").await {
        Ok(user) => {
            info!(user_id = user.id, "user added from admin");
            Ok(found(&change_path(user.id)))
        }
        Err(ApiError::Validation(errors)) => {
            Ok(Html(render::add_form(&staff, &form.email, &errors)).into_response())
        }
        Err(e) => Err(e),
    }
}

async fn render_change(
    state: &AppState,
    staff: &User,
    user: &User,
    values: ChangeValues<'_>,
    errors: &FieldErrors,
) -> Result<Html<String>, ApiError> {
    let token = AuthToken::for_user(&state.db, user.id).await?;
    Ok(Html(render::change_form(staff, user, token.as_ref(), values, errors)))
}

fn missing(staff: &User) -> Response {
    (StatusCode::NOT_FOUND, Html(render::not_found(staff))).into_response()
}

/// Path ids arrive as text; one that is not a number names no user.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

async fn lookup(state: &AppState, raw_id: &str) -> Result<Option<User>, ApiError> {
    match parse_id(raw_id) {
        Some(id) => Ok(User::find_by_id(&state.db, id).await?),
        None => Ok(None),
    }
}

#[instrument(skip(state, staff), fields(staff_id = staff.id))]
async fn change_page(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let Some(user) = lookup(&state, &id).await? else {
        return Ok(missing(&staff));
    };
    let html = render_change(&state, &staff, &user, ChangeValues::from(&user), &FieldErrors::new()).await?;
    Ok(html.into_response())
}

#[instrument(skip(state, staff, form), fields(staff_id = staff.id))]
async fn change_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<String>,
    Form(form): Form<ChangeUserForm>,
) -> Result<Response, ApiError> {
    let Some(user) = lookup(&state, &id).await? else {
        return Ok(missing(&staff));
    };
    let id = user.id;

    let mut errors = FieldErrors::new();
    let email = check_email(&mut errors, "email", non_empty(&form.email));
    let name = check_name(&mut errors, "name", Some(&form.name));
    if let Some(email) = &email {
        if User::email_taken(&state.db, email, Some(id)).await? {
            errors.add("email", EMAIL_TAKEN);
        }
    }

    let values = ChangeValues {
        email: &form.email,
        name: &form.name,
        is_active: form.is_active.is_some(),
        is_staff: form.is_staff.is_some(),
        is_superuser: form.is_superuser.is_some(),
    };
    let (Some(email), true) = (email, errors.is_empty()) else {
        return Ok(render_change(&state, &staff, &user, values, &errors).await?.into_response());
    };

    let changes = UserChanges {
        email: &email,
        name: &name,
        is_active: values.is_active,
        is_staff: values.is_staff,
        is_superuser: values.is_superuser,
    };
    match User::update(&state.db, id, changes).await {
        Ok(Some(_)) => {
            info!(user_id = id, "user changed from admin");
            Ok(found(CHANGELIST_PATH))
        }
        Ok(None) => Ok(missing(&staff)),
        Err(e) => match unique_to_field(e, "email") {
            ApiError::Validation(errors) => {
                Ok(render_change(&state, &staff, &user, values, &errors).await?.into_response())
            }
            other => Err(other),
        },
    }
}

#[instrument(skip(state, staff), fields(staff_id = staff.id))]
async fn delete_page(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match lookup(&state, &id).await? {
        Some(user) => Ok(Html(render::delete_confirm(&staff, &user)).into_response()),
        None => Ok(missing(&staff)),
    }
}

#[instrument(skip(state, staff), fields(staff_id = staff.id))]
async fn delete_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&id) else {
        return Ok(missing(&staff));
    };
    if !User::delete(&state.db, id).await? {
        return Ok(missing(&staff));
    }
    info!(user_id = id, "user deleted from admin");
    Ok(found(CHANGELIST_PATH))
}

#[cfg(test)]
mod tests {
    use super::{non_empty, parse_id};

    #[test]
    fn whitespace_only_input_is_missing() {
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty(" a "), Some(" a "));
    }

    #[test]
    fn only_numeric_path_ids_name_a_user() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("1.5"), None);
        assert_eq!(parse_id("99999999999999999999"), None);
    }
}
