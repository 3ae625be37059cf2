use std::{process, sync::Arc};

use bloghub::{
    application::{
        admin::posts::AdminPostService,
        auth::{AuthGateway, AuthService, Session},
        chrome::ChromeService,
        drafts::DraftAutosaver,
        error::AppError,
        feed::FeedService,
        render::MarkdownRenderer,
        repos::{PostListScope, PostsRepo},
        uploads::{ImageStore, UploadService},
    },
    config,
    domain::posts::BlogPost,
    infra::{
        backend::RemoteBackend,
        drafts::FileDraftStore,
        error::InfraError,
        http::{self, HttpState},
        memory::{MemoryAuth, MemoryPosts},
        telemetry,
        uploads::LocalImageStore,
    },
};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

const LOCAL_UPLOADS_ROUTE: &str = "/uploads";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Export(args) => run_export(settings, args).await,
    }
}

/// Adapters behind the application services, either hosted or in-process.
struct Backends {
    posts: Arc<dyn PostsRepo>,
    auth: Arc<dyn AuthGateway>,
    images: Arc<dyn ImageStore>,
    local_images: Option<Arc<LocalImageStore>>,
    remote: bool,
}

fn init_backends(settings: &config::Settings) -> Result<Backends, AppError> {
    match settings.backend.remote.as_ref() {
        Some(remote) => {
            let backend = RemoteBackend::connect(remote, &settings.backend)?;
            info!(
                target = "bloghub::backend",
                url = %remote.url,
                table = %settings.backend.posts_table,
                bucket = %settings.backend.images_bucket,
                "using hosted backend"
            );
            Ok(Backends {
                posts: backend.posts,
                auth: backend.auth,
                images: backend.images,
                local_images: None,
                remote: true,
            })
        }
        None => {
            let local = Arc::new(
                LocalImageStore::new(settings.uploads.directory.clone(), LOCAL_UPLOADS_ROUTE)
                    .map_err(|err| AppError::from(InfraError::Io(err)))?,
            );
            info!(
                target = "bloghub::backend",
                admin = %settings.backend.demo_admin_email,
                uploads = %settings.uploads.directory.display(),
                "no backend url configured, using in-memory demo backend"
            );
            Ok(Backends {
                posts: Arc::new(MemoryPosts::seeded()),
                auth: Arc::new(MemoryAuth::new(
                    &settings.backend.demo_admin_email,
                    &settings.backend.demo_admin_password,
                )),
                images: local.clone(),
                local_images: Some(local),
                remote: false,
            })
        }
    }
}

fn build_http_state(settings: &config::Settings, backends: Backends) -> HttpState {
    let renderer = Arc::new(MarkdownRenderer::new());
    let drafts = DraftAutosaver::new(
        Arc::new(FileDraftStore::new(settings.drafts.directory.clone())),
        settings.drafts.debounce,
    );

    HttpState {
        feed: Arc::new(FeedService::new(backends.posts.clone(), renderer.clone())),
        chrome: Arc::new(ChromeService::new(settings.site.clone())),
        auth: Arc::new(AuthService::new(backends.auth)),
        admin_posts: Arc::new(AdminPostService::new(backends.posts, drafts, renderer)),
        uploads: Arc::new(UploadService::new(backends.images)),
        local_images: backends.local_images,
        secure_cookies: settings.site.secure_cookies,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let backends = init_backends(&settings)?;
    let state = build_http_state(&settings, backends);
    let admin_posts = state.admin_posts.clone();

    let body_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| AppError::unexpected("upload limit exceeds platform usize"))?;
    let router = http::build_router(state, body_limit);

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;

    http::serve(listener, router, settings.server.graceful_shutdown)
        .await
        .map_err(AppError::from)?;

    let flushed = admin_posts.flush_drafts().await;
    info!(target = "bloghub::http", drafts_flushed = flushed, "server stopped");
    Ok(())
}

#[derive(Serialize)]
struct PostArchive {
    posts: Vec<BlogPost>,
}

async fn run_export(settings: config::Settings, args: config::ExportArgs) -> Result<(), AppError> {
    let backends = init_backends(&settings)?;
    let path = args.file;

    info!(
        target = "bloghub::export",
        path = %path.display(),
        "Starting export"
    );

    let session = if backends.remote {
        let (Some(email), Some(password)) = (args.email.as_deref(), args.password.as_deref())
        else {
            return Err(AppError::validation(
                "export from a hosted backend requires --email and --password",
            ));
        };
        Some(export_session(&backends, email, password).await?)
    } else {
        None
    };

    let posts = backends
        .posts
        .list_posts(session.as_ref(), PostListScope::Admin)
        .await
        .map_err(|err| AppError::unexpected(format!("failed to list posts: {err}")))?;
    let count = posts.len();

    let archive = toml::to_string_pretty(&PostArchive { posts })
        .map_err(|err| AppError::unexpected(format!("failed to encode archive: {err}")))?;
    tokio::fs::write(&path, archive)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;

    if let Some(session) = session {
        let auth = AuthService::new(backends.auth);
        if let Err(err) = auth.sign_out(&session.access_token).await {
            info!(target = "bloghub::export", error = %err, "sign-out after export failed");
        }
    }

    info!(target = "bloghub::export", posts = count, "Export completed");
    Ok(())
}

async fn export_session(
    backends: &Backends,
    email: &str,
    password: &str,
) -> Result<Session, AppError> {
    let auth = AuthService::new(backends.auth.clone());
    let session = auth
        .sign_in(email, password)
        .await
        .map_err(|err| AppError::validation(format!("export sign-in failed: {err}")))?;
    if !session.user.is_admin {
        return Err(AppError::validation(
            "export requires an account with the admin role",
        ));
    }
    Ok(session)
}
