use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::{ErrorReport, HttpError};
use crate::domain::drafts::SaveStatus;
use crate::domain::markdown::{TOOLS, Tool};
use crate::domain::posts::{BlogPost, PostCounts, PostInput};

/// Tags shown on a listing card.
const CARD_TAG_LIMIT: usize = 2;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_error_response(
    chrome: LayoutChrome,
    content: ErrorPageView,
    status: StatusCode,
) -> Response {
    let detail = content.title.clone();
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, status);
    ErrorReport::from_message("presentation::views::render_error_response", status, detail)
        .attach(&mut response);
    response
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    render_error_response(chrome, ErrorPageView::not_found(), StatusCode::NOT_FOUND)
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
}

/// Who is looking at the page.
#[derive(Clone, Default)]
pub struct ViewerView {
    pub signed_in: bool,
    pub is_admin: bool,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub viewer: ViewerView,
    pub page_title: String,
    pub search: String,
}

impl LayoutChrome {
    pub fn with_title(self, title: impl Into<String>) -> Self {
        let title = title.into();
        let page_title = if title.is_empty() {
            self.brand.title.clone()
        } else {
            format!("{title} | {}", self.brand.title)
        };
        Self { page_title, ..self }
    }

    pub fn with_search(self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self
        }
    }

    pub fn with_active_category(mut self, category: Option<&str>) -> Self {
        for entry in &mut self.navigation.entries {
            entry.is_active = category.is_some_and(|category| entry.label == category);
        }
        self
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub viewer: ViewerView,
    pub page_title: String,
    pub search: String,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            viewer: chrome.viewer,
            page_title: chrome.page_title,
            search: chrome.search,
            content,
        }
    }
}

#[derive(Clone)]
pub struct PostCard {
    pub href: String,
    pub title: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub author_name: String,
    pub author_initial: String,
    pub author_avatar: Option<String>,
    pub published: String,
    pub reading_time: u32,
    pub category: String,
    pub tags: Vec<String>,
}

impl From<&BlogPost> for PostCard {
    fn from(post: &BlogPost) -> Self {
        Self {
            href: post_href(post),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            cover_image: post.cover_image.clone(),
            author_name: post.author_name.clone(),
            author_initial: post.author_initial(),
            author_avatar: post.author_avatar.clone(),
            published: post.short_date(),
            reading_time: post.reading_time,
            category: post.category.clone(),
            tags: post.tags.iter().take(CARD_TAG_LIMIT).cloned().collect(),
        }
    }
}

pub fn post_href(post: &BlogPost) -> String {
    format!("/post/{}", post.slug())
}

#[derive(Clone)]
pub struct CategoryFilterView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

pub struct IndexContext {
    pub categories: Vec<CategoryFilterView>,
    pub posts: Vec<PostCard>,
    pub has_results: bool,
    pub search: String,
    pub is_filtered: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<IndexContext>,
}

#[derive(Debug)]
pub struct PostDetailContext {
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub author_name: String,
    pub author_initial: String,
    pub author_avatar: Option<String>,
    pub published: String,
    pub reading_time: u32,
    pub content_html: String,
    pub is_published: bool,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Post Not Found".to_string(),
            message: "The post you are looking for does not exist or is no longer available."
                .to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            title: "Something went wrong".to_string(),
            message: "Posts could not be loaded right now. Please try again in a moment."
                .to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to Home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

#[derive(Default)]
pub struct AuthPageView {
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub view: LayoutContext<AuthPageView>,
}

pub struct AdminPostRow {
    pub title: String,
    pub category: String,
    pub published: String,
    pub is_published: bool,
    pub view_href: String,
    pub edit_href: String,
    pub delete_href: String,
}

impl From<&BlogPost> for AdminPostRow {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            category: post.category.clone(),
            published: post.short_date(),
            is_published: post.is_published,
            view_href: post_href(post),
            edit_href: format!("/admin/post/{}", post.id),
            delete_href: format!("/admin/post/{}/delete", post.id),
        }
    }
}

pub struct AdminDashboardView {
    pub counts: PostCounts,
    pub rows: Vec<AdminPostRow>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub view: LayoutContext<AdminDashboardView>,
}

pub struct DraftRestoreView {
    pub saved_at: String,
    pub restore_href: String,
}

pub struct AdminEditorView {
    pub heading: &'static str,
    pub post_key: String,
    pub form: PostInput,
    pub form_action: String,
    pub draft_endpoint: String,
    pub preview: bool,
    pub preview_href: String,
    pub edit_href: String,
    pub preview_html: Option<String>,
    pub error: Option<String>,
    pub restore: Option<DraftRestoreView>,
    pub restored: bool,
    pub save_status: SaveStatus,
    pub autosave_ms: u64,
    pub tools: &'static [Tool],
}

impl AdminEditorView {
    pub fn tools() -> &'static [Tool] {
        TOOLS
    }
}

#[derive(Template)]
#[template(path = "admin/editor.html")]
pub struct AdminEditorTemplate {
    pub view: LayoutContext<AdminEditorView>,
}
