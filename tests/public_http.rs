use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use bloghub::{
    application::{
        admin::posts::AdminPostService, auth::AuthService, chrome::ChromeService,
        drafts::DraftAutosaver, feed::FeedService, render::MarkdownRenderer,
        uploads::UploadService,
    },
    config::SiteSettings,
    domain::{posts::seed_posts, slug::generate_slug},
    infra::{
        drafts::FileDraftStore,
        http::{HttpState, build_router},
        memory::{MemoryAuth, MemoryPosts},
        uploads::LocalImageStore,
    },
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@bloghub.dev";
const ADMIN_PASSWORD: &str = "correct horse";
const READER_EMAIL: &str = "reader@bloghub.dev";
const READER_PASSWORD: &str = "reader-pass";

fn build_app(dir: &Path) -> Router {
    let posts = Arc::new(MemoryPosts::seeded());
    let renderer = Arc::new(MarkdownRenderer::new());
    let images = Arc::new(
        LocalImageStore::new(dir.join("uploads"), "/uploads").expect("upload store should open"),
    );
    let drafts = DraftAutosaver::new(
        Arc::new(FileDraftStore::new(dir.join("drafts"))),
        Duration::from_millis(50),
    );
    let auth = MemoryAuth::new(ADMIN_EMAIL, ADMIN_PASSWORD).with_account(
        READER_EMAIL,
        READER_PASSWORD,
        false,
    );

    let state = HttpState {
        feed: Arc::new(FeedService::new(posts.clone(), renderer.clone())),
        chrome: Arc::new(ChromeService::new(SiteSettings {
            brand_title: "BlogHub".into(),
            nav_categories: vec!["Development".into(), "Design".into()],
            footer_copy: "Stories about building for the web.".into(),
            secure_cookies: false,
        })),
        auth: Arc::new(AuthService::new(Arc::new(auth))),
        admin_posts: Arc::new(AdminPostService::new(posts, drafts, renderer)),
        uploads: Arc::new(UploadService::new(images.clone())),
        local_images: Some(images),
        secure_cookies: false,
    };
    build_router(state, 1024 * 1024)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("router should respond");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

fn sign_in_request(email: &str, password: &str) -> Request<Body> {
    let body = format!(
        "email={}&password={}",
        email.replace('@', "%40"),
        password.replace(' ', "+")
    );
    Request::builder()
        .method(Method::POST)
        .uri("/auth")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn index_lists_published_posts() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    for post in seed_posts() {
        assert!(body.contains(&post.title), "missing {}", post.title);
    }
}

#[tokio::test]
async fn category_filter_narrows_the_listing() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());

    let (status, body) = get(&app, "/?category=Design").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Mastering Tailwind CSS"));
    assert!(body.contains("The Art of CSS Grid and Flexbox"));
    assert!(!body.contains("Building Scalable APIs with Node.js"));
}

#[tokio::test]
async fn search_without_matches_shows_empty_state() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());

    let (status, body) = get(&app, "/?q=quantum+knitting").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No posts found"));
    assert!(body.contains("Try a different category or search term."));
}

#[tokio::test]
async fn post_page_renders_markdown_by_slug() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());
    let post = seed_posts().remove(0);

    let (status, body) = get(&app, &format!("/post/{}", generate_slug(&post.title, post.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&post.title));
    assert!(body.contains("<h2"));
}

#[tokio::test]
async fn unknown_slug_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());

    let (status, _) = get(&app, "/post/no-such-post--not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/post/missing--00000000-0000-0000-0000-0000000000ff").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_redirect_anonymous_visitors() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());

    let response = app
        .clone()
        .oneshot(Request::get("/admin").body(Body::empty()).expect("request"))
        .await
        .expect("router should respond");
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/auth?denied=1"
    );

    let (status, body) = get(&app, "/auth?denied=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Access denied. Admin privileges required."));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());

    let response = app
        .clone()
        .oneshot(sign_in_request(ADMIN_EMAIL, "nope"))
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn non_admin_accounts_are_turned_away() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());

    let response = app
        .clone()
        .oneshot(sign_in_request(READER_EMAIL, READER_PASSWORD))
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn admin_sign_in_sets_session_cookie() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());

    let response = app
        .clone()
        .oneshot(sign_in_request(ADMIN_EMAIL, ADMIN_PASSWORD))
        .await
        .expect("router should respond");
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/admin"
    );
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie");
    assert!(cookie.starts_with("bloghub_session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn health_check_has_no_body() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_app(dir.path());

    let (status, body) = get(&app, "/_health").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}
