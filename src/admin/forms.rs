use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddUserForm {
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Unchecked checkboxes are simply absent from the submitted form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangeUserForm {
    pub email: String,
    pub name: String,
    pub is_active: Option<String>,
    pub is_staff: Option<String>,
    pub is_superuser: Option<String>,
}
