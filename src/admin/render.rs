//! Server-rendered pages for the admin site.
//!
//! Every value that came from a user goes through [`escape`].

use std::fmt::Write;

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    error::FieldErrors,
    tokens::AuthToken,
    users::{password::hash_summary, User},
};

pub const CHANGELIST_PATH: &str = "/admin/core/user/";

pub fn change_path(id: i64) -> String {
    format!("/admin/core/user/{id}/change/")
}

pub fn delete_path(id: i64) -> String {
    format!("/admin/core/user/{id}/delete/")
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn timestamp(value: Option<OffsetDateTime>) -> String {
    value
        .and_then(|v| v.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string())
}

fn layout(title: &str, staff: Option<&User>, body: &str) -> String {
    let nav = match staff {
        Some(user) => format!(
            r#"<div id="user-tools">Welcome, <strong>{}</strong>.
<form method="post" action="/admin/logout/"><button type="submit">Log out</button></form></div>"#,
            escape(&user.email)
        ),
        None => String::new(),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} | Site administration</title></head>
<body>
<div id="header"><h1 id="site-name"><a href="/admin/">Site administration</a></h1>{nav}</div>
<div id="content">
<h1>{title}</h1>
{body}
</div>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn error_list(errors: &FieldErrors, field: &str) -> String {
    let messages = errors.get(field);
    if messages.is_empty() {
        return String::new();
    }
    let mut out = String::from(r#"<ul class="errorlist">"#);
    for message in messages {
        let _ = write!(out, "<li>{}</li>", escape(message));
    }
    out.push_str("</ul>");
    out
}

pub fn login_page(next: Option<&str>, email: &str, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<p class="errornote">{}</p>"#, escape(e)))
        .unwrap_or_default();
    let next = next
        .map(|n| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(n)))
        .unwrap_or_default();
    let body = format!(
        r#"{error}
<form method="post" action="/admin/login/" id="login-form">
<label for="id_email">Email:</label> <input type="email" name="email" id="id_email" value="{email}" required>
<label for="id_password">Password:</label> <input type="password" name="password" id="id_password" required>
{next}
<button type="submit">Log in</button>
</form>"#,
        email = escape(email),
    );
    layout("Log in", None, &body)
}

pub fn changelist(staff: &User, users: &[User]) -> String {
    let mut rows = String::new();
    for user in users {
        let _ = write!(
            rows,
            r#"<tr><th><a href="{href}">{email}</a></th><td>{name}</td></tr>
"#,
            href = change_path(user.id),
            email = escape(&user.email),
            name = escape(&user.name),
        );
    }
    let body = format!(
        r#"<p><a class="addlink" href="/admin/core/user/add/">Add user</a></p>
<table id="result_list">
<thead><tr><th>Email</th><th>Name</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<p class="paginator">{count} user{plural}</p>"#,
        count = users.len(),
        plural = if users.len() == 1 { "" } else { "s" },
    );
    layout("Select user to change", Some(staff), &body)
}

pub fn add_form(staff: &User, email: &str, errors: &FieldErrors) -> String {
    let body = format!(
        r#"<form method="post" action="/admin/core/user/add/" id="user_form">
<fieldset>
{email_errors}<label for="id_email">Email:</label> <input type="email" name="email" id="id_email" value="{email}" required>
{p1_errors}<label for="id_password1">Password:</label> <input type="password" name="password1" id="id_password1" required>
{p2_errors}<label for="id_password2">Password confirmation:</label> <input type="password" name="password2" id="id_password2" required>
</fieldset>
<button type="submit" name="_save">Save</button>
</form>"#,
        email_errors = error_list(errors, "email"),
        p1_errors = error_list(errors, "password1"),
        p2_errors = error_list(errors, "password2"),
        email = escape(email),
    );
    layout("Add user", Some(staff), &body)
}

/// Values shown on the change form; on a failed submit these are what the admin typed.
pub struct ChangeValues<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl<'a> From<&'a User> for ChangeValues<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            email: &user.email,
            name: &user.name,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

fn checkbox(name: &str, label: &str, checked: bool) -> String {
    format!(
        r#"<div><input type="checkbox" name="{name}" id="id_{name}"{checked}> <label for="id_{name}">{label}</label></div>"#,
        checked = if checked { " checked" } else { "" },
    )
}

pub fn change_form(
    staff: &User,
    user: &User,
    token: Option<&AuthToken>,
    values: ChangeValues<'_>,
    errors: &FieldErrors,
) -> String {
    let token = match token {
        Some(t) => format!("issued {}", timestamp(Some(t.created_at))),
        None => "none".to_string(),
    };
    let body = format!(
        r#"<form method="post" action="{action}" id="user_form">
<fieldset><h2>Credentials</h2>
{email_errors}<label for="id_email">Email:</label> <input type="email" name="email" id="id_email" value="{email}" required>
<div class="readonly" id="password-summary">Password: {password}</div>
</fieldset>
<fieldset><h2>Personal info</h2>
{name_errors}<label for="id_name">Name:</label> <input type="text" name="name" id="id_name" value="{name}">
</fieldset>
<fieldset><h2>Permissions</h2>
{active}
{staff_box}
{superuser}
</fieldset>
<fieldset><h2>Important dates</h2>
<div class="readonly">Last login: {last_login}</div>
<div class="readonly">Date joined: {date_joined}</div>
<div class="readonly">API token: {token}</div>
</fieldset>
<button type="submit" name="_save">Save</button>
<a class="deletelink" href="{delete}">Delete</a>
</form>"#,
        action = change_path(user.id),
        delete = delete_path(user.id),
        email_errors = error_list(errors, "email"),
        name_errors = error_list(errors, "name"),
        email = escape(values.email),
        name = escape(values.name),
        password = escape(&hash_summary(&user.password_hash)),
        active = checkbox("is_active", "Active", values.is_active),
        staff_box = checkbox("is_staff", "Staff status", values.is_staff),
        superuser = checkbox("is_superuser", "Superuser status", values.is_superuser),
        last_login = timestamp(user.last_login),
        date_joined = timestamp(Some(user.date_joined)),
    );
    layout(&format!("Change user {}", user.email), Some(staff), &body)
}

pub fn delete_confirm(staff: &User, user: &User) -> String {
    let body = format!(
        r#"<p>Are you sure you want to delete the user "{email}"? Its API token will be deleted as well.</p>
<form method="post" action="{action}">
<button type="submit">Yes, I'm sure</button>
<a href="{back}">No, take me back</a>
</form>"#,
        email = escape(&user.email),
        action = delete_path(user.id),
        back = change_path(user.id),
    );
    layout("Are you sure?", Some(staff), &body)
}

pub fn not_found(staff: &User) -> String {
    layout(
        "Not found",
        Some(staff),
        "<p>User with this ID doesn't exist. Perhaps it was deleted?</p>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, email: &str, name: &str) -> User {
        User {
            id,
            email: email.into(),
            name: name.into(),
            password_hash: "not-a-hash".into(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login: None,
            date_joined: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn changelist_shows_each_email_and_name() {
        let staff = user(1, "admin@wapcos.co.in", "");
        let users = vec![staff.clone(), user(2, "ara@wapcos.co.in", "Arun <Arora>")];
        let html = changelist(&staff, &users);
        assert!(html.contains("ara@wapcos.co.in"));
        assert!(html.contains("Arun &lt;Arora&gt;"));
        assert!(html.contains(r#"href="/admin/core/user/2/change/""#));
        assert!(html.contains("2 users"));
    }

    #[test]
    fn change_form_never_prints_the_raw_hash() {
        let staff = user(1, "admin@wapcos.co.in", "");
        let mut target = user(2, "ara@wapcos.co.in", "Arun Arora");
        target.password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$ZGlnZXN0ZGlnZXN0".into();
        let html = change_form(&staff, &target, None, ChangeValues::from(&target), &FieldErrors::new());
        assert!(!html.contains("ZGlnZXN0ZGlnZXN0"));
        assert!(html.contains("algorithm: argon2id"));
        assert!(html.contains("API token: none"));
    }

    #[test]
    fn errors_render_next_to_fields() {
        let staff = user(1, "admin@wapcos.co.in", "");
        let errors = FieldErrors::single("password2", "The two password fields didn't match.");
        let html = add_form(&staff, "x@y.z", &errors);
        assert!(html.contains("The two password fields didn&#x27;t match."));
    }
}
