use std::io::ErrorKind;

use axum::{
    Extension, Form, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{error, warn};

use crate::{
    application::{
        auth::{ACCESS_DENIED_MESSAGE, AuthError, Session},
        error::HttpError,
        feed::FeedError,
        uploads::UploadError,
    },
    domain::filter::PostQuery,
    presentation::views::{
        AuthPageView, AuthTemplate, ErrorPageView, IndexTemplate, LayoutChrome, LayoutContext,
        PostTemplate, render_error_response, render_not_found_response, render_template_response,
    },
};

use super::{HttpState, middleware::SESSION_COOKIE};

pub(super) fn build_public_router() -> Router<HttpState> {
    Router::new()
        .route("/", get(index))
        .route("/post/{slug}", get(post_detail))
        .route("/auth", get(auth_page).post(sign_in))
        .route("/auth/logout", post(sign_out))
        .route("/uploads/{*path}", get(serve_upload))
        .route("/_health", get(health))
        .fallback(fallback)
}

pub(super) fn viewer(session: &Option<Extension<Session>>) -> Option<&Session> {
    session.as_ref().map(|Extension(session)| session)
}

async fn index(
    State(state): State<HttpState>,
    session: Option<Extension<Session>>,
    Query(query): Query<PostQuery>,
) -> Response {
    let chrome = state
        .chrome
        .load(viewer(&session))
        .with_search(query.search().unwrap_or_default())
        .with_active_category(query.category());

    match state.feed.index_context(&query).await {
        Ok(content) => {
            let view = LayoutContext::new(chrome, content);
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, chrome),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    session: Option<Extension<Session>>,
    Path(slug): Path<String>,
) -> Response {
    let chrome = state.chrome.load(viewer(&session));

    match state.feed.post_context(&slug, viewer(&session)).await {
        Ok(content) => {
            let chrome = chrome.with_title(content.title.clone());
            let view = LayoutContext::new(chrome, content);
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, chrome),
    }
}

async fn fallback(State(state): State<HttpState>, session: Option<Extension<Session>>) -> Response {
    render_not_found_response(state.chrome.load(viewer(&session)))
}

fn feed_error_to_response(err: FeedError, chrome: LayoutChrome) -> Response {
    let err = HttpError::from(err);
    let mut response = if err.status() == StatusCode::NOT_FOUND {
        render_not_found_response(chrome)
    } else {
        render_error_response(chrome, ErrorPageView::unavailable(), err.status())
    };
    err.attach_report(&mut response);
    response
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuthQuery {
    denied: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SignInForm {
    email: String,
    password: String,
}

async fn auth_page(
    State(state): State<HttpState>,
    session: Option<Extension<Session>>,
    Query(query): Query<AuthQuery>,
) -> Response {
    if viewer(&session).is_some_and(|session| session.user.is_admin) {
        return Redirect::to("/admin").into_response();
    }

    let content = AuthPageView {
        notice: query.denied.map(|_| ACCESS_DENIED_MESSAGE.to_string()),
        ..AuthPageView::default()
    };
    render_auth_page(&state, content, StatusCode::OK)
}

async fn sign_in(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Response {
    const SOURCE: &str = "infra::http::public::sign_in";

    let session = match state.auth.sign_in(&form.email, &form.password).await {
        Ok(session) => session,
        Err(err) => {
            let (status, message) = match &err {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid login credentials")
                }
                AuthError::MissingCredentials => {
                    (StatusCode::BAD_REQUEST, "Please enter your email and password")
                }
                AuthError::Backend(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Sign-in is unavailable right now",
                ),
            };
            let content = AuthPageView {
                email: form.email,
                error: Some(message.to_string()),
                notice: None,
            };
            let mut response = render_auth_page(&state, content, status);
            HttpError::from_error(SOURCE, status, message, &err).attach_report(&mut response);
            return response;
        }
    };

    if !session.user.is_admin {
        if let Err(err) = state.auth.sign_out(&session.access_token).await {
            warn!(target = SOURCE, error = %err, "failed to end non-admin session");
        }
        let content = AuthPageView {
            email: form.email,
            error: Some(ACCESS_DENIED_MESSAGE.to_string()),
            notice: None,
        };
        return render_auth_page(&state, content, StatusCode::FORBIDDEN);
    }

    let cookie = Cookie::build((SESSION_COOKIE, session.access_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookies)
        .build();
    (jar.add(cookie), Redirect::to("/admin")).into_response()
}

async fn sign_out(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(err) = state.auth.sign_out(cookie.value()).await {
            warn!(
                target = "infra::http::public::sign_out",
                error = %err,
                "backend sign-out failed"
            );
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/")).into_response()
}

fn render_auth_page(state: &HttpState, content: AuthPageView, status: StatusCode) -> Response {
    let chrome = state.chrome.load(None).with_title("Admin Login");
    let view = LayoutContext::new(chrome, content);
    render_template_response(AuthTemplate { view }, status)
}

async fn serve_upload(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_upload";

    let not_found = || {
        HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Upload not found",
            "The requested upload is not available",
        )
        .into_response()
    };

    let Some(store) = state.local_images.as_ref() else {
        return not_found();
    };

    match store.read(&path).await {
        Ok(bytes) => build_upload_response(&path, bytes),
        Err(UploadError::InvalidPath) => not_found(),
        Err(UploadError::Io(err)) if err.kind() == ErrorKind::NotFound => not_found(),
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored upload"
            );
            HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read uploaded file",
                err.to_string(),
            )
            .into_response()
        }
    }
}

fn build_upload_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
