//! Publishing and editing posts through the multipart forms.

mod common;

use axum::http::StatusCode;
use common::{body_text, is_redirect, location, TestApp};
use khateraty::messages;
use khateraty::validation::ValidationError;

// 1x1 transparent PNG
const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

async fn post_count(app: &TestApp) -> i64 {
    app.repo().count_posts().await.unwrap()
}

#[tokio::test]
async fn test_short_content_is_rejected_without_writing() {
    let app = TestApp::new();
    let (_, cookie) = app.member("mona@example.com", "Mona").await;

    let response = app
        .post_multipart("/create", Some(&cookie), &[("content", "قصيرة"), ("category", "")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(ValidationError::ContentTooShort.message()));
    // The draft is kept in the form
    assert!(html.contains("قصيرة"));
    assert_eq!(post_count(&app).await, 0);

    let response = app
        .post_multipart("/create", Some(&cookie), &[("content", "   "), ("category", "")])
        .await;
    assert!(body_text(response).await.contains(ValidationError::EmptyContent.message()));
    assert_eq!(post_count(&app).await, 0);
}

#[tokio::test]
async fn test_unknown_category_and_overlong_content_are_rejected() {
    let app = TestApp::new();
    let (_, cookie) = app.member("mona@example.com", "Mona").await;

    let response = app
        .post_multipart(
            "/create",
            Some(&cookie),
            &[("content", "A perfectly fine thought"), ("category", "رياضي")],
        )
        .await;
    assert!(body_text(response).await.contains(ValidationError::UnknownCategory.message()));

    let long = "ا".repeat(501);
    let response = app
        .post_multipart("/create", Some(&cookie), &[("content", &long), ("category", "")])
        .await;
    assert!(body_text(response).await.contains(ValidationError::ContentTooLong.message()));
    assert_eq!(post_count(&app).await, 0);
}

#[tokio::test]
async fn test_publish_with_category_and_image() {
    let app = TestApp::new();
    let (mona, cookie) = app.member("mona@example.com", "Mona").await;

    let response = app
        .post_multipart_file(
            "/create",
            Some(&cookie),
            &[("content", "  الوطن ليس مكاناً بل إحساس  "), ("category", "وطني")],
            Some(("image", "flag.png", "image/png", PNG)),
        )
        .await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/");

    let posts = app.repo().posts_by_author(&mona).await.unwrap();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.content, "الوطن ليس مكاناً بل إحساس");
    assert_eq!(post.category.as_deref(), Some("وطني"));

    let image_url = post.image_url.clone().expect("image stored");
    assert!(image_url.starts_with(&format!("/storage/post-images/posts/{mona}/")));
    assert!(image_url.ends_with(".png"));

    let response = app.get(&image_url, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let app = TestApp::new();
    let (_, cookie) = app.member("mona@example.com", "Mona").await;

    let response = app
        .post_multipart_file(
            "/create",
            Some(&cookie),
            &[("content", "A thought with a bad attachment"), ("category", "")],
            Some(("image", "notes.txt", "text/plain", b"hello")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(ValidationError::NotAnImage.message()));
    assert_eq!(post_count(&app).await, 0);
}

#[tokio::test]
async fn test_upload_name_never_picks_the_served_type() {
    let app = TestApp::new();
    let (mona, cookie) = app.member("mona@example.com", "Mona").await;
    let script: &[u8] = b"<script>alert(document.domain)</script>";

    let response = app
        .post_multipart_file(
            "/create",
            Some(&cookie),
            &[("content", "A thought with a renamed attachment"), ("category", "")],
            Some(("image", "evil.html", "image/png", script)),
        )
        .await;
    assert!(is_redirect(&response));

    let posts = app.repo().posts_by_author(&mona).await.unwrap();
    let image_url = posts[0].image_url.clone().expect("image stored");
    assert!(image_url.ends_with(".png"), "{image_url}");

    let response = app.get(&image_url, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_svg_uploads_are_rejected() {
    let app = TestApp::new();
    let (mona, cookie) = app.member("mona@example.com", "Mona").await;
    let svg: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\" onload=\"alert(1)\"/>";

    let response = app
        .post_multipart_file(
            "/create",
            Some(&cookie),
            &[("content", "A thought with a vector attachment"), ("category", "")],
            Some(("image", "logo.svg", "image/svg+xml", svg)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(ValidationError::NotAnImage.message()));
    assert_eq!(post_count(&app).await, 0);

    let response = app
        .post_multipart_file(
            "/profile/avatar",
            Some(&cookie),
            &[],
            Some(("avatar", "me.svg", "image/svg+xml", svg)),
        )
        .await;
    assert_eq!(location(&response), "/profile");
    let profile = app.repo().get_profile(&mona).await.unwrap().expect("profile");
    assert!(profile.avatar_url.is_none());
}

#[tokio::test]
async fn test_author_edits_post_and_category_is_required() {
    let app = TestApp::new();
    let (mona, cookie) = app.member("mona@example.com", "Mona").await;
    let post = app.publish(&mona, "First draft of a thought", None).await;
    let uri = format!("/edit/{}", post.id);

    let response = app.get(&uri, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("First draft of a thought"));

    let response = app
        .post_multipart(&uri, Some(&cookie), &[("content", "Second draft"), ("category", "")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(ValidationError::MissingCategory.message()));

    let response = app
        .post_multipart(&uri, Some(&cookie), &[("content", "Second draft"), ("category", "ملهم")])
        .await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), format!("/post/{}", post.id));

    let stored = app.repo().get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(stored.content, "Second draft");
    assert_eq!(stored.category.as_deref(), Some("ملهم"));
}

#[tokio::test]
async fn test_strangers_cannot_edit() {
    let app = TestApp::new();
    let (mona, _) = app.member("mona@example.com", "Mona").await;
    let (_, omar) = app.member("omar@example.com", "Omar").await;
    let post = app.publish(&mona, "Mona's own thought here", None).await;

    let response = app
        .post_multipart(
            &format!("/edit/{}", post.id),
            Some(&omar),
            &[("content", "Hijacked"), ("category", "ساخر")],
        )
        .await;
    assert!(is_redirect(&response));
    assert_eq!(location(&response), "/unauthorized");

    let stored = app.repo().get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(stored.content, "Mona's own thought here");
}

#[tokio::test]
async fn test_unknown_post_pages_are_404() {
    let app = TestApp::new();
    let response = app.get("/post/does-not-exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/nowhere", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains(messages::NOT_FOUND));
}
