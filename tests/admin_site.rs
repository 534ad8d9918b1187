//! Admin console pages, driven the way a signed-in staff member would.

mod support;

use axum::{http::StatusCode, Router};
use userbase::{
    users::{
        password::verify_password,
        services::{create_superuser, create_user},
        User,
    },
    AppState,
};

struct Fixture {
    app: Router,
    state: AppState,
    admin: User,
    user: User,
    cookie: String,
}

async fn set_up() -> Fixture {
    let (app, state) = support::build().await;
    let admin = create_superuser(&state.db, "admin@wapcos.co.in", "Admin@123").await.unwrap();
    let user = create_user(&state.db, "ara@wapcos.co.in", "Admin@123", "Arun Arora").await.unwrap();
    let cookie = support::session_cookie_for(&state, admin.id);
    Fixture {
        app,
        state,
        admin,
        user,
        cookie,
    }
}

#[tokio::test]
async fn users_listed() {
    let f = set_up().await;
    let response = support::send(&f.app, support::get_page("/admin/core/user/", Some(&f.cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = support::body_text(response).await;
    assert!(html.contains(&f.user.name));
    assert!(html.contains(&f.user.email));
    assert!(html.contains(&f.admin.email));
}

#[tokio::test]
async fn user_change_page() {
    let f = set_up().await;
    let url = format!("/admin/core/user/{}/change/", f.user.id);
    let response = support::send(&f.app, support::get_page(&url, Some(&f.cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = support::body_text(response).await;
    assert!(html.contains("Arun Arora"));
    assert!(!html.contains(&f.user.password_hash));
}

#[tokio::test]
async fn create_user_page() {
    let f = set_up().await;
    let response = support::send(&f.app, support::get_page("/admin/core/user/add/", Some(&f.cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login() {
    let f = set_up().await;
    let response = support::send(&f.app, support::get_page("/admin/core/user/", None)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(support::location(&response), "/admin/login/?next=%2Fadmin%2Fcore%2Fuser%2F");

    let response = support::send(&f.app, support::get_page("/admin/login/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn tampered_session_is_ignored() {
    let f = set_up().await;
    let forged = format!("{}x", f.cookie);
    let response = support::send(&f.app, support::get_page("/admin/core/user/", Some(&forged))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn staff_can_sign_in_with_the_form() {
    let f = set_up().await;
    let response = support::send(
        &f.app,
        support::post_form(
            "/admin/login/",
            None,
            "email=admin%40wapcos.co.in&password=Admin%40123&next=%2Fadmin%2Fcore%2Fuser%2F",
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(support::location(&response), "/admin/core/user/");
    let cookie = support::set_cookie(&response).expect("session cookie");

    let response = support::send(&f.app, support::get_page("/admin/core/user/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let admin = User::find_by_id(&f.state.db, f.admin.id).await.unwrap().unwrap();
    assert!(admin.last_login.is_some());
}

#[tokio::test]
async fn non_staff_cannot_sign_in() {
    let f = set_up().await;
    let response = support::send(
        &f.app,
        support::post_form("/admin/login/", None, "email=ara%40wapcos.co.in&password=Admin%40123"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(support::set_cookie(&response).is_none());
    let html = support::body_text(response).await;
    assert!(html.contains("Please enter the correct email and password for a staff account."));
}

#[tokio::test]
async fn off_site_next_is_not_followed() {
    let f = set_up().await;
    let response = support::send(
        &f.app,
        support::post_form(
            "/admin/login/",
            None,
            "email=admin%40wapcos.co.in&password=Admin%40123&next=https%3A%2F%2Fevil.example%2F",
        ),
    )
    .await;
    assert_eq!(support::location(&response), "/admin/core/user/");
}

#[tokio::test]
async fn demoted_staff_lose_access() {
    let f = set_up().await;
    sqlx::query("UPDATE users SET is_staff = 0 WHERE id = ?")
        .bind(f.admin.id)
        .execute(&f.state.db)
        .await
        .unwrap();

    let response = support::send(&f.app, support::get_page("/admin/core/user/", Some(&f.cookie))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn add_user_from_admin() {
    let f = set_up().await;
    let response = support::send(
        &f.app,
        support::post_form(
            "/admin/core/user/add/",
            Some(&f.cookie),
            "email=new%40wapcos.co.in&password1=secret123&password2=secret123",
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let created = User::find_by_email(&f.state.db, "new@wapcos.co.in").await.unwrap().expect("created");
    assert_eq!(support::location(&response), format!("/admin/core/user/{}/change/", created.id));
    assert!(verify_password("secret123", &created.password_hash).unwrap());
    assert!(!created.is_staff);
}

#[tokio::test]
async fn add_user_rejects_mismatched_passwords() {
    let f = set_up().await;
    let response = support::send(
        &f.app,
        support::post_form(
            "/admin/core/user/add/",
            Some(&f.cookie),
            "email=new%40wapcos.co.in&password1=secret123&password2=secret124",
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = support::body_text(response).await;
    assert!(html.contains("The two password fields didn&#x27;t match."));
    assert!(User::find_by_email(&f.state.db, "new@wapcos.co.in").await.unwrap().is_none());
}

#[tokio::test]
async fn add_user_rejects_existing_email() {
    let f = set_up().await;
    let response = support::send(
        &f.app,
        support::post_form(
            "/admin/core/user/add/",
            Some(&f.cookie),
            "email=ara%40wapcos.co.in&password1=secret123&password2=secret123",
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(support::body_text(response).await.contains("user with this email already exists."));
}

#[tokio::test]
async fn change_user_from_admin() {
    let f = set_up().await;
    let url = format!("/admin/core/user/{}/change/", f.user.id);
    let response = support::send(
        &f.app,
        support::post_form(
            &url,
            Some(&f.cookie),
            "email=ara%40wapcos.co.in&name=Arun+K+Arora&is_active=on&is_staff=on",
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(support::location(&response), "/admin/core/user/");

    let stored = User::find_by_id(&f.state.db, f.user.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Arun K Arora");
    assert!(stored.is_active && stored.is_staff);
    assert!(!stored.is_superuser);
    assert_eq!(stored.password_hash, f.user.password_hash);
}

#[tokio::test]
async fn change_user_rejects_taken_email() {
    let f = set_up().await;
    let url = format!("/admin/core/user/{}/change/", f.user.id);
    let response = support::send(
        &f.app,
        support::post_form(&url, Some(&f.cookie), "email=admin%40wapcos.co.in&name=Arun+Arora&is_active=on"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let stored = User::find_by_id(&f.state.db, f.user.id).await.unwrap().unwrap();
    assert_eq!(stored.email, "ara@wapcos.co.in");
}

#[tokio::test]
async fn unknown_user_pages_are_not_found() {
    let f = set_up().await;
    let response = support::send(&f.app, support::get_page("/admin/core/user/9999/change/", Some(&f.cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = support::send(
        &f.app,
        support::post_form("/admin/core/user/9999/delete/", Some(&f.cookie), ""),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_ids_get_the_admin_not_found_page() {
    let f = set_up().await;
    for url in ["/admin/core/user/abc/change/", "/admin/core/user/abc/delete/"] {
        let response = support::send(&f.app, support::get_page(url, Some(&f.cookie))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{url}");
        let html = support::body_text(response).await;
        assert!(html.contains("<html"), "{url}");
    }

    let response = support::send(
        &f.app,
        support::post_form("/admin/core/user/abc/change/", Some(&f.cookie), "email=x%40wapcos.co.in"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = support::send(&f.app, support::post_form("/admin/core/user/abc/delete/", Some(&f.cookie), "")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(User::list(&f.state.db).await.unwrap().len(), 2);
}

#[tokio::test]
async fn delete_user_from_admin() {
    let f = set_up().await;
    let url = format!("/admin/core/user/{}/delete/", f.user.id);

    let response = support::send(&f.app, support::get_page(&url, Some(&f.cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = support::send(&f.app, support::post_form(&url, Some(&f.cookie), "")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(User::find_by_id(&f.state.db, f.user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let f = set_up().await;
    let response = support::send(&f.app, support::post_form("/admin/logout/", Some(&f.cookie), "")).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(support::location(&response), "/admin/login/");
    assert_eq!(support::set_cookie(&response).as_deref(), Some("userbase_session="));
}

#[tokio::test]
async fn admin_root_redirects_to_changelist() {
    let f = set_up().await;
    let response = support::send(&f.app, support::get_page("/admin/", Some(&f.cookie))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(support::location(&response), "/admin/core/user/");
}
