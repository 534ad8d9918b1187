use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldErrors;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_FIELD_LEN: usize = 255;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const EMAIL_TAKEN: &str = "user with this email already exists.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trim and lower-case the domain part; the local part is kept as typed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn too_long() -> String {
    format!("Ensure this field has no more than {MAX_FIELD_LEN} characters.")
}

/// Check a submitted email and return it normalized when it passes.
pub fn check_email(errors: &mut FieldErrors, field: &str, email: Option<&str>) -> Option<String> {
    let Some(email) = email else {
        errors.add(field, REQUIRED);
        return None;
    };
    let email = email.trim();
    if email.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if email.chars().count() > MAX_FIELD_LEN {
        errors.add(field, too_long());
        return None;
    }
    if !is_valid_email(email) {
        errors.add(field, INVALID_EMAIL);
        return None;
    }
    Some(normalize_email(email))
}

/// Passwords are taken verbatim; surrounding whitespace counts.
pub fn check_password<'a>(errors: &mut FieldErrors, field: &str, password: Option<&'a str>) -> Option<&'a str> {
    let Some(password) = password else {
        errors.add(field, REQUIRED);
        return None;
    };
    if password.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("Ensure this field has at least {MIN_PASSWORD_LEN} characters."),
        );
        return None;
    }
    Some(password)
}

pub fn check_name(errors: &mut FieldErrors, field: &str, name: Option<&str>) -> String {
    let name = name.map(str::trim).unwrap_or_default();
    if name.chars().count() > MAX_FIELD_LEN {
        errors.add(field, too_long());
    }
    name.to_string()
}
