use axum::{
    Extension, Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::Multipart;
use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description};
use tracing::error;

use crate::{
    application::{
        admin::posts::{AdminPostError, EditorState},
        auth::Session,
        error::HttpError,
        uploads::{ImageFile, UploadedImage},
    },
    domain::{
        drafts::{PostKey, SaveStatus},
        markdown::{Insertion, insert_image, insert_syntax, shortcut_syntax},
        posts::{DEFAULT_READING_TIME, PostInput},
    },
    presentation::views::{
        AdminDashboardTemplate, AdminEditorTemplate, AdminEditorView, DraftRestoreView,
        LayoutContext, render_not_found_response, render_template_response,
    },
};

use super::{HttpState, middleware::require_admin};

const SOURCE_BASE: &str = "infra::http::admin";
const DRAFT_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [year] [hour]:[minute]");

pub(super) fn build_admin_router() -> Router<HttpState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/post/{key}", get(editor).post(save_post))
        .route("/admin/post/{key}/draft", get(draft_status).post(autosave))
        .route("/admin/post/{key}/delete", post(delete_post))
        .route("/admin/editor/insert", post(insert))
        .route("/admin/editor/preview", post(preview))
        .route("/admin/uploads", post(upload_images))
        .route_layer(middleware::from_fn(require_admin))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DashboardNotice {
    Created,
    Updated,
    Deleted,
}

impl DashboardNotice {
    fn message(self) -> &'static str {
        match self {
            DashboardNotice::Created => "Post created successfully!",
            DashboardNotice::Updated => "Post updated successfully!",
            DashboardNotice::Deleted => "Post deleted successfully!",
        }
    }

    fn query(self) -> &'static str {
        match self {
            DashboardNotice::Created => "/admin?notice=created",
            DashboardNotice::Updated => "/admin?notice=updated",
            DashboardNotice::Deleted => "/admin?notice=deleted",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DashboardQuery {
    notice: Option<DashboardNotice>,
}

async fn dashboard(
    State(state): State<HttpState>,
    Extension(session): Extension<Session>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let notice = query.notice.map(|notice| notice.message().to_string());
    match state.admin_posts.dashboard(&session, notice).await {
        Ok(content) => {
            let chrome = state
                .chrome
                .load(Some(&session))
                .with_title("Admin Dashboard");
            let view = LayoutContext::new(chrome, content);
            render_template_response(AdminDashboardTemplate { view }, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn delete_post(
    State(state): State<HttpState>,
    Extension(session): Extension<Session>,
    Path(key): Path<String>,
) -> Response {
    let Ok(PostKey::Existing(id)) = key.parse::<PostKey>() else {
        return render_not_found_response(state.chrome.load(Some(&session)));
    };

    match state.admin_posts.delete_post(&session, id).await {
        Ok(()) => Redirect::to(DashboardNotice::Deleted.query()).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EditorQuery {
    preview: Option<String>,
    restore: Option<String>,
}

fn flag(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "on" | "yes"))
}

/// The editor form as the browser submits it; the checkbox is absent when
/// unchecked and the reading time arrives as text.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EditorForm {
    title: String,
    excerpt: String,
    content: String,
    category: String,
    tags: String,
    cover_image: String,
    reading_time: String,
    is_published: Option<String>,
}

impl From<EditorForm> for PostInput {
    fn from(form: EditorForm) -> Self {
        let reading_time = match form.reading_time.trim() {
            "" => DEFAULT_READING_TIME,
            raw => raw.parse().unwrap_or(0),
        };
        PostInput {
            title: form.title,
            excerpt: form.excerpt,
            content: form.content,
            category: form.category,
            tags: form.tags,
            cover_image: form.cover_image,
            reading_time,
            is_published: flag(form.is_published.as_deref()),
        }
    }
}

async fn editor(
    State(state): State<HttpState>,
    Extension(session): Extension<Session>,
    Path(key): Path<String>,
    Query(query): Query<EditorQuery>,
) -> Response {
    let Ok(key) = key.parse::<PostKey>() else {
        return render_not_found_response(state.chrome.load(Some(&session)));
    };

    let editor_state = match state
        .admin_posts
        .editor_state(&session, key, flag(query.restore.as_deref()))
        .await
    {
        Ok(editor_state) => editor_state,
        Err(AdminPostError::NotFound) => {
            return render_not_found_response(state.chrome.load(Some(&session)));
        }
        Err(err) => return HttpError::from(err).into_response(),
    };

    let preview = flag(query.preview.as_deref());
    render_editor(&state, &session, editor_state, preview, None, StatusCode::OK).await
}

async fn save_post(
    State(state): State<HttpState>,
    Extension(session): Extension<Session>,
    Path(key): Path<String>,
    Form(form): Form<EditorForm>,
) -> Response {
    let Ok(key) = key.parse::<PostKey>() else {
        return render_not_found_response(state.chrome.load(Some(&session)));
    };
    let input = PostInput::from(form);

    match state.admin_posts.save_post(&session, key, input.clone()).await {
        Ok(_) => {
            let notice = if key.is_new() {
                DashboardNotice::Created
            } else {
                DashboardNotice::Updated
            };
            Redirect::to(notice.query()).into_response()
        }
        Err(AdminPostError::Invalid(err)) => {
            let post = match key.id() {
                Some(id) => match state.admin_posts.find_post(&session, id).await {
                    Ok(post) => Some(post),
                    Err(err) => return HttpError::from(err).into_response(),
                },
                None => None,
            };
            let editor_state = EditorState {
                key,
                post,
                form: input,
                recoverable: None,
                restored: false,
            };
            let mut response = render_editor(
                &state,
                &session,
                editor_state,
                false,
                Some(err.to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
            HttpError::from(AdminPostError::Invalid(err)).attach_report(&mut response);
            response
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn render_editor(
    state: &HttpState,
    session: &Session,
    editor: EditorState,
    preview: bool,
    error: Option<String>,
    status: StatusCode,
) -> Response {
    let key = editor.key;
    let base_href = format!("/admin/post/{key}");

    let preview_html = if preview {
        match state.admin_posts.preview(&editor.form.content) {
            Ok(html) => Some(html),
            Err(err) => return HttpError::from(err).into_response(),
        }
    } else {
        None
    };

    let restore = editor
        .recoverable_saved_at()
        .map(|saved_at| DraftRestoreView {
            saved_at: saved_at.format(DRAFT_TIME_FORMAT).unwrap_or_default(),
            restore_href: format!("{base_href}?restore=1"),
        });

    let heading = if key.is_new() {
        "Create New Post"
    } else {
        "Edit Post"
    };

    let content = AdminEditorView {
        heading,
        post_key: key.to_string(),
        form: editor.form,
        form_action: base_href.clone(),
        draft_endpoint: format!("{base_href}/draft"),
        preview,
        preview_href: format!("{base_href}?preview=1"),
        edit_href: base_href,
        preview_html,
        error,
        restore,
        restored: editor.restored,
        save_status: state.admin_posts.draft_status(session, key).await,
        autosave_ms: state.admin_posts.autosave_window().as_millis() as u64,
        tools: AdminEditorView::tools(),
    };

    let chrome = state.chrome.load(Some(session)).with_title(heading);
    let view = LayoutContext::new(chrome, content);
    render_template_response(AdminEditorTemplate { view }, status)
}

#[derive(Debug, Serialize)]
struct DraftStatusResponse {
    status: SaveStatus,
    label: &'static str,
}

impl From<SaveStatus> for DraftStatusResponse {
    fn from(status: SaveStatus) -> Self {
        Self {
            label: status.label(),
            status,
        }
    }
}

async fn draft_status(
    State(state): State<HttpState>,
    Extension(session): Extension<Session>,
    Path(key): Path<String>,
) -> Response {
    let Ok(key) = key.parse::<PostKey>() else {
        return unknown_post(&key);
    };
    let status = state.admin_posts.draft_status(&session, key).await;
    Json(DraftStatusResponse::from(status)).into_response()
}

async fn autosave(
    State(state): State<HttpState>,
    Extension(session): Extension<Session>,
    Path(key): Path<String>,
    Form(form): Form<EditorForm>,
) -> Response {
    let Ok(key) = key.parse::<PostKey>() else {
        return unknown_post(&key);
    };

    match state
        .admin_posts
        .autosave(&session, key, &PostInput::from(form))
        .await
    {
        Ok(status) => Json(DraftStatusResponse::from(status)).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn unknown_post(key: &str) -> Response {
    HttpError::new(
        SOURCE_BASE,
        StatusCode::NOT_FOUND,
        "Post not found",
        format!("`{key}` is neither `new` nor a post id"),
    )
    .into_response()
}

#[derive(Debug, Deserialize)]
struct ImageReference {
    name: String,
    url: String,
}

/// A toolbar click, a keyboard shortcut, or an uploaded image to splice into
/// the content at the current selection.
#[derive(Debug, Deserialize)]
struct InsertRequest {
    content: String,
    start: usize,
    #[serde(default)]
    end: Option<usize>,
    #[serde(default)]
    syntax: Option<String>,
    #[serde(default)]
    shortcut: Option<String>,
    #[serde(default)]
    image: Option<ImageReference>,
}

async fn insert(Json(request): Json<InsertRequest>) -> Result<Json<Insertion>, HttpError> {
    let end = request.end.unwrap_or(request.start);

    if let Some(image) = request.image {
        return Ok(Json(insert_image(
            &request.content,
            request.start,
            &image.name,
            &image.url,
        )));
    }

    let syntax = request
        .syntax
        .or_else(|| request.shortcut.as_deref().and_then(shortcut_syntax))
        .ok_or_else(|| {
            HttpError::new(
                "infra::http::admin::insert",
                StatusCode::BAD_REQUEST,
                "Unknown formatting action",
                "request carried neither a known shortcut nor syntax",
            )
        })?;

    Ok(Json(insert_syntax(
        &request.content,
        request.start,
        end,
        &syntax,
    )))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PreviewRequest {
    content: String,
}

async fn preview(
    State(state): State<HttpState>,
    Form(request): Form<PreviewRequest>,
) -> Result<Html<String>, HttpError> {
    Ok(Html(state.admin_posts.preview(&request.content)?))
}

async fn upload_images(
    State(state): State<HttpState>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Json<Vec<UploadedImage>>, HttpError> {
    const SOURCE: &str = "infra::http::admin::upload_images";

    let mut files = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                let status = err.status();
                error!(
                    target = SOURCE,
                    status = status.as_u16(),
                    error = %err,
                    "failed to read multipart payload"
                );
                return Err(HttpError::from_error(
                    SOURCE,
                    status,
                    "Upload could not be read",
                    &err,
                ));
            }
        };

        let Some(file_name) = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field.bytes().await.map_err(|err| {
            HttpError::from_error(SOURCE, err.status(), "Upload could not be read", &err)
        })?;

        files.push(ImageFile {
            file_name,
            content_type,
            bytes,
        });
    }

    let uploaded = state.uploads.upload_all(&session, files).await?;
    Ok(Json(uploaded))
}
