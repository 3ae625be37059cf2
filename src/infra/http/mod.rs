mod admin;
mod middleware;
mod public;

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::application::{
    admin::posts::AdminPostService, auth::AuthService, chrome::ChromeService, feed::FeedService,
    uploads::UploadService,
};
use crate::infra::error::InfraError;
use crate::infra::uploads::LocalImageStore;

pub use middleware::{RequestContext, SESSION_COOKIE};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub chrome: Arc<ChromeService>,
    pub auth: Arc<AuthService>,
    pub admin_posts: Arc<AdminPostService>,
    pub uploads: Arc<UploadService>,
    /// Present when images are stored on local disk and served by this process.
    pub local_images: Option<Arc<LocalImageStore>>,
    pub secure_cookies: bool,
}

/// Public and admin routes behind the shared request middleware.
pub fn build_router(state: HttpState, upload_body_limit: usize) -> Router {
    public::build_public_router()
        .merge(admin::build_admin_router())
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_session,
        ))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .layer(DefaultBodyLimit::max(upload_body_limit))
        .with_state(state)
}

/// Serve until Ctrl-C (or SIGTERM), then give in-flight requests `grace` to
/// finish.
pub async fn serve(listener: TcpListener, router: Router, grace: Duration) -> Result<(), InfraError> {
    let addr = listener.local_addr()?;
    info!(target = "bloghub::http", addr = %addr, "listening");

    let stopping = Arc::new(Notify::new());
    let trigger = stopping.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!(target = "bloghub::http", "shutdown requested");
            trigger.notify_one();
        })
        .into_future();

    tokio::select! {
        result = server => result.map_err(InfraError::from),
        _ = async {
            stopping.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "bloghub::http",
                grace_ms = grace.as_millis() as u64,
                "grace period elapsed with requests still open"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "bloghub::http", error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "bloghub::http", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
