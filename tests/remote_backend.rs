//! Remote adapters against a local stand-in for the hosted backend.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bloghub::{
    application::{
        auth::{AuthError, AuthGateway, AuthUser, Session},
        repos::{PostListScope, PostsRepo, RepoError},
        uploads::{ImageStore, UploadError},
    },
    domain::posts::{NewPost, seed_posts},
    infra::backend::{BackendClient, RemoteAuth, RemoteImageStore, RemotePosts},
};
use serde_json::{Value, json};
use url::Url;
use uuid::Uuid;

const ANON_KEY: &str = "anon-key";
const ADMIN_TOKEN: &str = "admin-token";
const ADMIN_ID: Uuid = Uuid::from_u128(0xa11ce);
const MISSING_ID: Uuid = Uuid::from_u128(0xdead);

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: HashMap<String, String>,
    bearer: Option<String>,
    api_key: Option<String>,
    content_type: Option<String>,
}

#[derive(Clone, Default)]
struct FakeBackend {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeBackend {
    fn record(&self, method: &str, path: &str, query: &HashMap<String, String>, headers: &HeaderMap) {
        let header = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().expect("lock").push(Recorded {
            method: method.to_string(),
            path: path.to_string(),
            query: query.clone(),
            bearer: header(header::AUTHORIZATION)
                .and_then(|value| value.strip_prefix("Bearer ").map(str::to_string)),
            api_key: headers
                .get("apikey")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            content_type: header(header::CONTENT_TYPE),
        });
    }

    fn last(&self) -> Recorded {
        self.requests
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("a recorded request")
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn admin_user() -> Value {
    json!({ "id": ADMIN_ID, "email": "admin@bloghub.dev" })
}

async fn token(
    State(fake): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record("POST", "/auth/v1/token", &query, &headers);
    if body["password"] == "secret" {
        Json(json!({ "access_token": ADMIN_TOKEN, "user": admin_user() })).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response()
    }
}

async fn user(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(ADMIN_TOKEN) => Json(admin_user()).into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn roles(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    if query.get("user_id") == Some(&format!("eq.{ADMIN_ID}")) {
        Json(json!([{ "role": "admin" }]))
    } else {
        Json(json!([]))
    }
}

fn post_rows(published_only: bool) -> Value {
    let mut posts = seed_posts();
    posts[0].is_published = false;
    let rows: Vec<_> = posts
        .into_iter()
        .filter(|post| !published_only || post.is_published)
        .collect();
    serde_json::to_value(rows).expect("rows")
}

async fn list_posts(
    State(fake): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    fake.record("GET", "/rest/v1/blog_posts", &query, &headers);
    let published_only = query.get("is_published").map(String::as_str) == Some("eq.true");
    let rows = post_rows(published_only);
    match query.get("id").and_then(|filter| filter.strip_prefix("eq.")) {
        Some(id) => Json(Value::Array(
            rows.as_array()
                .expect("array")
                .iter()
                .filter(|row| row["id"] == id)
                .cloned()
                .collect(),
        )),
        None => Json(rows),
    }
}

async fn insert_post(
    State(fake): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> Response {
    fake.record("POST", "/rest/v1/blog_posts", &query, &headers);
    if bearer(&headers) != Some(ADMIN_TOKEN) {
        return (StatusCode::FORBIDDEN, "row-level security").into_response();
    }
    row["id"] = json!(Uuid::from_u128(0xbeef));
    (StatusCode::CREATED, Json(json!([row]))).into_response()
}

async fn mutate_post(
    State(fake): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    fake.record("MUTATE", "/rest/v1/blog_posts", &query, &headers);
    let target = query.get("id").cloned().unwrap_or_default();
    if target == format!("eq.{MISSING_ID}") {
        return Json(json!([]));
    }
    let mut row = post_rows(false)[1].clone();
    if let Ok(Value::Object(changes)) = serde_json::from_slice::<Value>(&body) {
        for (key, value) in changes {
            row[key] = value;
        }
    }
    Json(json!([row]))
}

async fn upload_object(
    State(fake): State<FakeBackend>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Json<Value> {
    fake.record(
        "POST",
        &format!("/storage/v1/object/{bucket}/{path}"),
        &HashMap::new(),
        &headers,
    );
    Json(json!({ "Key": format!("{bucket}/{path}") }))
}

async fn spawn_backend() -> (SocketAddr, FakeBackend) {
    let fake = FakeBackend::default();
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/logout", post(logout))
        .route("/rest/v1/user_roles", get(roles))
        .route(
            "/rest/v1/blog_posts",
            get(list_posts)
                .post(insert_post)
                .patch(mutate_post)
                .delete(mutate_post),
        )
        .route("/storage/v1/object/{bucket}/{*path}", post(upload_object))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend");
    });
    (addr, fake)
}

fn client(addr: SocketAddr) -> BackendClient {
    let base = Url::parse(&format!("http://{addr}")).expect("url");
    BackendClient::new(&base, ANON_KEY.to_string(), Duration::from_secs(5)).expect("client")
}

fn admin_session() -> Session {
    Session {
        access_token: ADMIN_TOKEN.to_string(),
        user: AuthUser {
            id: ADMIN_ID,
            email: Some("admin@bloghub.dev".into()),
            is_admin: true,
        },
    }
}

fn new_post() -> NewPost {
    NewPost {
        title: "Remote Notes".into(),
        excerpt: "From the table".into(),
        content: "Body".into(),
        category: "Backend".into(),
        tags: vec!["rest".into()],
        cover_image: None,
        reading_time: 3,
        is_published: true,
        author_name: "Admin".into(),
        author_avatar: None,
    }
}

#[tokio::test]
async fn sign_in_resolves_admin_role() {
    let (addr, fake) = spawn_backend().await;
    let auth = RemoteAuth::new(client(addr));

    let session = auth
        .sign_in("admin@bloghub.dev", "secret")
        .await
        .expect("sign in");
    assert_eq!(session.access_token, ADMIN_TOKEN);
    assert_eq!(session.user.id, ADMIN_ID);
    assert!(session.user.is_admin);

    let recorded = fake.requests.lock().expect("lock")[0].clone();
    assert_eq!(recorded.query.get("grant_type").map(String::as_str), Some("password"));
    assert_eq!(recorded.api_key.as_deref(), Some(ANON_KEY));
}

#[tokio::test]
async fn rejected_password_is_invalid_credentials() {
    let (addr, _) = spawn_backend().await;
    let auth = RemoteAuth::new(client(addr));

    let err = auth
        .sign_in("admin@bloghub.dev", "wrong")
        .await
        .expect_err("rejected");
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn tokens_resolve_until_the_backend_refuses_them() {
    let (addr, _) = spawn_backend().await;
    let auth = RemoteAuth::new(client(addr));

    let user = auth
        .user_for_token(ADMIN_TOKEN)
        .await
        .expect("lookup")
        .expect("known token");
    assert!(user.is_admin);

    assert!(auth.user_for_token("expired").await.expect("lookup").is_none());
    auth.sign_out(ADMIN_TOKEN).await.expect("sign out");
}

#[tokio::test]
async fn public_listing_filters_published_with_anon_key() {
    let (addr, fake) = spawn_backend().await;
    let posts = RemotePosts::new(client(addr), "blog_posts");

    let listed = posts
        .list_posts(None, PostListScope::Public)
        .await
        .expect("list");
    assert_eq!(listed.len(), seed_posts().len() - 1);
    assert!(listed.iter().all(|post| post.is_published));

    let recorded = fake.last();
    assert_eq!(recorded.method, "GET");
    assert_eq!(recorded.bearer.as_deref(), Some(ANON_KEY));
    assert_eq!(recorded.query.get("order").map(String::as_str), Some("published_at.desc"));
    assert_eq!(recorded.query.get("is_published").map(String::as_str), Some("eq.true"));
}

#[tokio::test]
async fn admin_listing_uses_the_viewer_token() {
    let (addr, fake) = spawn_backend().await;
    let posts = RemotePosts::new(client(addr), "blog_posts");
    let session = admin_session();

    let listed = posts
        .list_posts(Some(&session), PostListScope::Admin)
        .await
        .expect("list");
    assert_eq!(listed.len(), seed_posts().len());

    let recorded = fake.last();
    assert_eq!(recorded.bearer.as_deref(), Some(ADMIN_TOKEN));
    assert!(!recorded.query.contains_key("is_published"));
}

#[tokio::test]
async fn find_post_returns_none_for_unknown_ids() {
    let (addr, _) = spawn_backend().await;
    let posts = RemotePosts::new(client(addr), "blog_posts");
    let known = seed_posts().remove(3);

    let found = posts
        .find_post(None, known.id)
        .await
        .expect("find")
        .expect("known post");
    assert_eq!(found.title, known.title);
    assert!(posts.find_post(None, MISSING_ID).await.expect("find").is_none());
}

#[tokio::test]
async fn writes_need_an_authorised_session() {
    let (addr, _) = spawn_backend().await;
    let posts = RemotePosts::new(client(addr), "blog_posts");

    let created = posts
        .create_post(&admin_session(), new_post())
        .await
        .expect("create");
    assert_eq!(created.id, Uuid::from_u128(0xbeef));
    assert_eq!(created.title, "Remote Notes");

    let anonymous = Session {
        access_token: ANON_KEY.to_string(),
        ..admin_session()
    };
    let err = posts
        .create_post(&anonymous, new_post())
        .await
        .expect_err("refused");
    assert!(matches!(err, RepoError::Unauthorized));
}

#[tokio::test]
async fn update_and_delete_report_missing_rows() {
    let (addr, fake) = spawn_backend().await;
    let posts = RemotePosts::new(client(addr), "blog_posts");
    let session = admin_session();
    let target = seed_posts().remove(1);

    let updated = posts
        .update_post(&session, target.id, new_post())
        .await
        .expect("update");
    assert_eq!(updated.title, "Remote Notes");
    assert_eq!(
        fake.last().query.get("id"),
        Some(&format!("eq.{}", target.id))
    );

    let err = posts
        .update_post(&session, MISSING_ID, new_post())
        .await
        .expect_err("missing");
    assert!(matches!(err, RepoError::NotFound));

    posts.delete_post(&session, target.id).await.expect("delete");
    let err = posts
        .delete_post(&session, MISSING_ID)
        .await
        .expect_err("missing");
    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn images_land_in_the_bucket_with_public_urls() {
    let (addr, fake) = spawn_backend().await;
    let store = RemoteImageStore::new(client(addr), "blog-images");

    let url = store
        .put(
            &admin_session(),
            "abc123-1700000000000.png",
            "image/png",
            Bytes::from_static(b"\x89PNG"),
        )
        .await
        .expect("upload");
    assert_eq!(
        url,
        format!("http://{addr}/storage/v1/object/public/blog-images/abc123-1700000000000.png")
    );

    let recorded = fake.last();
    assert_eq!(recorded.path, "/storage/v1/object/blog-images/abc123-1700000000000.png");
    assert_eq!(recorded.content_type.as_deref(), Some("image/png"));
    assert_eq!(recorded.bearer.as_deref(), Some(ADMIN_TOKEN));

    let err = store
        .put(&admin_session(), "../escape.png", "image/png", Bytes::new())
        .await
        .expect_err("rejected path");
    assert!(matches!(err, UploadError::InvalidPath));
}
