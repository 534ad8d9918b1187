use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use crate::{
    config::AdminSeed,
    error::{is_unique_violation, ApiError},
    users::{
        password::{hash_password, verify_password},
        repo_types::{NewUser, User, UserChanges},
        validation::{normalize_email, EMAIL_TAKEN, REQUIRED},
    },
};

/// Create a regular account. The email is normalized and the password hashed.
pub async fn create_user(db: &SqlitePool, email: &str, password: &str, name: &str) -> Result<User, ApiError> {
    create_with_flags(db, email, password, name, false).await
}

/// Create an account that may sign in to the admin site with full rights.
pub async fn create_superuser(db: &SqlitePool, email: &str, password: &str) -> Result<User, ApiError> {
    create_with_flags(db, email, password, "", true).await
}

#[instrument(skip(db, password))]
async fn create_with_flags(
    db: &SqlitePool,
    email: &str,
    password: &str,
    name: &str,
    superuser: bool,
) -> Result<User, ApiError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ApiError::field("email", REQUIRED));
    }
    if User::email_taken(db, &email, None).await? {
        return Err(ApiError::field("email", EMAIL_TAKEN));
    }

    let password_hash = hash_password(password)?;
    let user = User::insert(
        db,
        NewUser {
            email: &email,
            name,
            password_hash: &password_hash,
            is_staff: superuser,
            is_superuser: superuser,
        },
    )
    .await
    .map_err(|e| unique_to_field(e, "email"))?;

    info!(user_id = user.id, email = %user.email, superuser, "user created");
    Ok(user)
}

/// Credentials check shared by the token endpoint and the admin sign-in.
/// The email is normalized the same way it was when the account was stored.
/// Unknown, inactive and mismatching accounts all come back as `None`.
pub async fn authenticate(db: &SqlitePool, email: &str, password: &str) -> Result<Option<User>, ApiError> {
    let Some(user) = User::find_by_email(db, &normalize_email(email)).await? else {
        return Ok(None);
    };
    if !user.is_active {
        warn!(user_id = user.id, "inactive user tried to authenticate");
        return Ok(None);
    }
    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(Some(user)),
        Ok(false) => Ok(None),
        Err(e) => {
            warn!(user_id = user.id, error = %e, "stored password hash is unreadable");
            Ok(None)
        }
    }
}

/// Partial update of the caller's own profile. `None` leaves a field alone.
#[derive(Debug, Default)]
pub struct ProfileUpdate<'a> {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<&'a str>,
}

pub async fn update_profile(db: &SqlitePool, user: &User, update: ProfileUpdate<'_>) -> Result<User, ApiError> {
    let email = update.email.unwrap_or_else(|| user.email.clone());
    if email != user.email && User::email_taken(db, &email, Some(user.id)).await? {
        return Err(ApiError::field("email", EMAIL_TAKEN));
    }
    let name = update.name.unwrap_or_else(|| user.name.clone());
    let password_hash = update.password.map(hash_password).transpose()?;

    let mut tx = db.begin().await?;
    let mut updated = User::update(
        &mut *tx,
        user.id,
        UserChanges {
            email: &email,
            name: &name,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        },
    )
    .await
    .map_err(|e| unique_to_field(e, "email"))?
    .ok_or(ApiError::NotFound)?;

    let password_changed = password_hash.is_some();
    if let Some(hash) = password_hash {
        User::set_password_hash(&mut *tx, user.id, &hash).await?;
        updated.password_hash = hash;
    }
    tx.commit().await?;

    if password_changed {
        info!(user_id = user.id, "password changed");
    }
    Ok(updated)
}

/// Create the configured superuser unless the email is already registered.
pub async fn ensure_admin_seed(db: &SqlitePool, seed: &AdminSeed) -> Result<(), ApiError> {
    if User::find_by_email(db, &normalize_email(&seed.email)).await?.is_some() {
        return Ok(());
    }
    let user = create_superuser(db, &seed.email, &seed.password).await?;
    info!(user_id = user.id, email = %user.email, "seeded admin account");
    Ok(())
}

pub(crate) fn unique_to_field(err: sqlx::Error, field: &str) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::field(field, EMAIL_TAKEN)
    } else {
        ApiError::Database(err)
    }
}
