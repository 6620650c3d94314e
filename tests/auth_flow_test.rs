//! Registration, email confirmation, login and password recovery through
//! the HTTP surface.

mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, confirmation_code, cookie_pair, is_redirect, location, TestApp};
use khateraty::messages;

const EMAIL: &str = "t@example.com";
const PASSWORD: &str = "secret1";

async fn register(app: &TestApp) {
    let response = app
        .post_form(
            "/auth/register",
            None,
            &[
                ("full_name", "Test User"),
                ("email", EMAIL),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
                ("terms", "on"),
            ],
        )
        .await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/auth/login");
}

async fn login(app: &TestApp, password: &str) -> axum::http::Response<axum::body::Body> {
    app.post_form(
        "/auth/login",
        None,
        &[("email", EMAIL), ("password", password)],
    )
    .await
}

#[tokio::test]
async fn test_register_confirm_login_complete() {
    let app = TestApp::new();
    register(&app).await;

    // Profile row exists but is not complete yet
    let users = {
        let conn = app.conn();
        let mut stmt = conn.prepare("SELECT id FROM profiles WHERE email = ?1").unwrap();
        let ids: Vec<String> = stmt
            .query_map([EMAIL], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        ids
    };
    assert_eq!(users.len(), 1);
    let profile = app.repo().get_profile(&users[0]).await.unwrap().unwrap();
    assert!(!profile.profile_completed);
    assert_eq!(profile.full_name.as_deref(), Some("Test User"));

    // Unconfirmed: login is refused with the localized message
    let response = login(&app, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(messages::EMAIL_NOT_CONFIRMED));

    // Following the emailed link confirms and signs in
    let code = confirmation_code(&app.mailer, EMAIL).await;
    let response = app.get(&format!("/auth/callback?code={code}"), None).await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/complete-account");
    assert!(cookie_pair(&response, "khateraty_session").is_some());

    // The link is single use
    let response = app.get(&format!("/auth/callback?code={code}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(messages::CALLBACK_INVALID_LINK));

    // Login now works and still points at profile completion
    let response = login(&app, PASSWORD).await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/complete-account");
    let session = cookie_pair(&response, "khateraty_session").unwrap();

    let response = app
        .post_multipart(
            "/complete-account",
            Some(&session),
            &[("full_name", "Test User"), ("phone_number", "01012345678")],
        )
        .await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/");

    let response = login(&app, PASSWORD).await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_wrong_password_is_reported_in_arabic() {
    let app = TestApp::new();
    app.member(EMAIL, "Test User").await;

    let response = login(&app, "not-it").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(messages::INVALID_CREDENTIALS));
}

#[tokio::test]
async fn test_duplicate_registration_flags_email() {
    let app = TestApp::new();
    register(&app).await;

    let response = app
        .post_form(
            "/auth/register",
            None,
            &[
                ("full_name", "Someone Else"),
                ("email", EMAIL),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
                ("terms", "on"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(messages::ALREADY_REGISTERED));
}

#[tokio::test]
async fn test_callback_without_code_fails_cleanly() {
    let app = TestApp::new();

    let response = app.get("/auth/callback", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(messages::CALLBACK_MISSING_CODE));

    let response = app.get("/auth/callback/exchange", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert_eq!(json["message"], messages::CALLBACK_MISSING_CODE);
}

#[tokio::test]
async fn test_exchange_endpoint_returns_redirect_target() {
    let app = TestApp::new();
    register(&app).await;
    let code = confirmation_code(&app.mailer, EMAIL).await;

    let response = app
        .get(&format!("/auth/callback/exchange?code={code}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["redirect"], "/complete-account");
    assert_eq!(json["user"]["email"], EMAIL);
}

#[tokio::test]
async fn test_guard_redirects_by_session() {
    let app = TestApp::new();
    for path in ["/profile", "/create", "/complete-account"] {
        let response = app.get(path, None).await;
        assert!(is_redirect(&response), "{path} should redirect");
        assert_eq!(location(&response), "/auth/login");
    }

    let (_, cookie) = app.member(EMAIL, "Test User").await;
    for path in ["/auth/login", "/auth/register"] {
        let response = app.get(path, Some(&cookie)).await;
        assert!(is_redirect(&response), "{path} should redirect");
        assert_eq!(location(&response), "/");
    }
    let response = app.get("/profile", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Protection is by plain path prefix
    let response = app.get("/profileX", None).await;
    assert_eq!(location(&response), "/auth/login");
    let response = app.get("/profileX", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = TestApp::new();
    let (_, cookie) = app.member(EMAIL, "Test User").await;

    let response = app.post("/auth/logout", Some(&cookie)).await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/");
    assert_eq!(
        cookie_pair(&response, "khateraty_session").as_deref(),
        Some("khateraty_session=")
    );

    let response = app.get("/profile", Some(&cookie)).await;
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_password_recovery_sets_new_password() {
    let app = TestApp::new();
    app.member(EMAIL, "Test User").await;

    let response = app
        .post_form("/auth/forgot-password", None, &[("email", EMAIL)])
        .await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/auth/login");

    let code = confirmation_code(&app.mailer, EMAIL).await;
    let response = app
        .get(&format!("/auth/reset-password?code={code}"), None)
        .await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/auth/reset-password");
    let recovery = cookie_pair(&response, "khateraty_session").unwrap();

    // A recovery session does not count as signed in
    let response = app.get("/profile", Some(&recovery)).await;
    assert_eq!(location(&response), "/auth/login");

    let response = app
        .post_form(
            "/auth/reset-password",
            Some(&recovery),
            &[("password", "newpass1"), ("confirm_password", "newpass1")],
        )
        .await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/");

    assert!(is_redirect(&login(&app, "newpass1").await));
    let response = login(&app, PASSWORD).await;
    assert!(body_text(response).await.contains(messages::INVALID_CREDENTIALS));
}

#[tokio::test]
async fn test_unknown_email_reset_is_silent() {
    let app = TestApp::new();
    let response = app
        .post_form("/auth/forgot-password", None, &[("email", "nobody@example.com")])
        .await;
    assert!(is_redirect(&response));
    assert!(app.mailer.messages().await.is_empty());
}
