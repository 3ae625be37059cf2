//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU64, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "bloghub";
const ENV_PREFIX: &str = "BLOGHUB";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DRAFTS_DIR: &str = "drafts";
const DEFAULT_DRAFT_DEBOUNCE_MS: u64 = 2000;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_POSTS_TABLE: &str = "blog_posts";
const DEFAULT_IMAGES_BUCKET: &str = "blog-images";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DEMO_ADMIN_EMAIL: &str = "admin@bloghub.dev";
const DEFAULT_DEMO_ADMIN_PASSWORD: &str = "bloghub-admin";
const DEFAULT_BRAND_TITLE: &str = "BlogHub";
const DEFAULT_NAV_CATEGORIES: [&str; 2] = ["Development", "Design"];
const DEFAULT_FOOTER_COPY: &str = "Stories about building for the web.";

/// Command-line arguments for the BlogHub binary.
#[derive(Debug, Parser)]
#[command(name = "bloghub", version, about = "BlogHub blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BLOGHUB_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the BlogHub HTTP service.
    Serve(Box<ServeArgs>),
    /// Export every post, drafts included, to a TOML archive.
    #[command(name = "export")]
    Export(ExportArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct BackendOverride {
    /// Override the hosted backend base URL.
    #[arg(long = "backend-url", value_name = "URL")]
    pub backend_url: Option<String>,

    /// Override the hosted backend anonymous API key.
    #[arg(long = "backend-anon-key", env = "BLOGHUB_BACKEND_ANON_KEY", value_name = "KEY")]
    pub backend_anon_key: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub backend: BackendOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the draft storage directory.
    #[arg(long = "drafts-directory", value_name = "PATH")]
    pub drafts_directory: Option<PathBuf>,

    /// Override the auto-save quiet window in milliseconds.
    #[arg(long = "drafts-debounce-ms", value_name = "MS")]
    pub drafts_debounce_ms: Option<u64>,

    /// Override the local uploads directory.
    #[arg(long = "uploads-directory", value_name = "PATH")]
    pub uploads_directory: Option<PathBuf>,

    /// Override the maximum request size for uploads in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,

    /// Mark the session cookie as `Secure`.
    #[arg(
        long = "site-secure-cookies",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub site_secure_cookies: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub backend: BackendOverride,

    /// Admin account used to read drafts from the hosted backend.
    #[arg(long = "email", env = "BLOGHUB_EXPORT_EMAIL", value_name = "EMAIL")]
    pub email: Option<String>,

    /// Password for `--email`.
    #[arg(long = "password", env = "BLOGHUB_EXPORT_PASSWORD", value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Path to the export file to write.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub backend: BackendSettings,
    pub drafts: DraftSettings,
    pub uploads: UploadSettings,
    pub site: SiteSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Where posts, accounts and images live.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Hosted backend; `None` selects the in-memory demo backend.
    pub remote: Option<RemoteBackendSettings>,
    pub posts_table: String,
    pub images_bucket: String,
    pub demo_admin_email: String,
    pub demo_admin_password: String,
}

#[derive(Debug, Clone)]
pub struct RemoteBackendSettings {
    pub url: Url,
    pub anon_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DraftSettings {
    pub directory: PathBuf,
    pub debounce: Duration,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub directory: PathBuf,
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub brand_title: String,
    pub nav_categories: Vec<String>,
    pub footer_copy: String,
    pub secure_cookies: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("site.nav_categories")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Export(args)) => raw.apply_backend_override(&args.backend),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    backend: RawBackendSettings,
    drafts: RawDraftSettings,
    uploads: RawUploadSettings,
    site: RawSiteSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(directory) = overrides.drafts_directory.as_ref() {
            self.drafts.directory = Some(directory.clone());
        }
        if let Some(debounce) = overrides.drafts_debounce_ms {
            self.drafts.debounce_ms = Some(debounce);
        }
        if let Some(directory) = overrides.uploads_directory.as_ref() {
            self.uploads.directory = Some(directory.clone());
        }
        if let Some(limit) = overrides.uploads_max_request_bytes {
            self.uploads.max_request_bytes = Some(limit);
        }
        if let Some(secure) = overrides.site_secure_cookies {
            self.site.secure_cookies = Some(secure);
        }

        self.apply_backend_override(&overrides.backend);
    }

    fn apply_backend_override(&mut self, overrides: &BackendOverride) {
        if let Some(url) = overrides.backend_url.as_ref() {
            self.backend.url = Some(url.clone());
        }
        if let Some(key) = overrides.backend_anon_key.as_ref() {
            self.backend.anon_key = Some(key.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            backend,
            drafts,
            uploads,
            site,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            backend: build_backend_settings(backend)?,
            drafts: build_draft_settings(drafts)?,
            uploads: build_upload_settings(uploads)?,
            site: build_site_settings(site)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_backend_settings(backend: RawBackendSettings) -> Result<BackendSettings, LoadError> {
    let url = non_blank(backend.url);
    let anon_key = non_blank(backend.anon_key);

    let remote = match (url, anon_key) {
        (None, _) => None,
        (Some(_), None) => {
            return Err(LoadError::invalid(
                "backend.anon_key",
                "required when backend.url is set",
            ));
        }
        (Some(url), Some(anon_key)) => {
            let url = Url::parse(&url)
                .map_err(|err| LoadError::invalid("backend.url", format!("invalid url: {err}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "backend.url",
                    "scheme must be http or https",
                ));
            }

            let timeout_secs = backend
                .timeout_seconds
                .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);
            if timeout_secs == 0 {
                return Err(LoadError::invalid(
                    "backend.timeout_seconds",
                    "must be greater than zero",
                ));
            }

            Some(RemoteBackendSettings {
                url,
                anon_key,
                timeout: Duration::from_secs(timeout_secs),
            })
        }
    };

    let posts_table =
        non_blank(backend.posts_table).unwrap_or_else(|| DEFAULT_POSTS_TABLE.to_string());
    if !posts_table
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(LoadError::invalid(
            "backend.posts_table",
            "only ASCII letters, digits and underscores are allowed",
        ));
    }

    let images_bucket =
        non_blank(backend.images_bucket).unwrap_or_else(|| DEFAULT_IMAGES_BUCKET.to_string());

    Ok(BackendSettings {
        remote,
        posts_table,
        images_bucket,
        demo_admin_email: non_blank(backend.demo_admin_email)
            .unwrap_or_else(|| DEFAULT_DEMO_ADMIN_EMAIL.to_string()),
        demo_admin_password: backend
            .demo_admin_password
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_DEMO_ADMIN_PASSWORD.to_string()),
    })
}

fn build_draft_settings(drafts: RawDraftSettings) -> Result<DraftSettings, LoadError> {
    let directory = drafts
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DRAFTS_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "drafts.directory",
            "path must not be empty",
        ));
    }

    let debounce_ms = drafts.debounce_ms.unwrap_or(DEFAULT_DRAFT_DEBOUNCE_MS);
    if debounce_ms == 0 {
        return Err(LoadError::invalid(
            "drafts.debounce_ms",
            "must be greater than zero",
        ));
    }

    Ok(DraftSettings {
        directory,
        debounce: Duration::from_millis(debounce_ms),
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let directory = uploads
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));

    let max_request_bytes_value = uploads
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("uploads.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(UploadSettings {
        directory,
        max_request_bytes,
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let brand_title =
        non_blank(site.brand_title).unwrap_or_else(|| DEFAULT_BRAND_TITLE.to_string());

    let nav_categories = match site.nav_categories {
        Some(categories) => categories
            .into_iter()
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty())
            .collect(),
        None => DEFAULT_NAV_CATEGORIES
            .iter()
            .map(|category| category.to_string())
            .collect(),
    };

    Ok(SiteSettings {
        brand_title,
        nav_categories,
        footer_copy: site
            .footer_copy
            .unwrap_or_else(|| DEFAULT_FOOTER_COPY.to_string()),
        secure_cookies: site.secure_cookies.unwrap_or(false),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBackendSettings {
    url: Option<String>,
    anon_key: Option<String>,
    timeout_seconds: Option<u64>,
    posts_table: Option<String>,
    images_bucket: Option<String>,
    demo_admin_email: Option<String>,
    demo_admin_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDraftSettings {
    directory: Option<PathBuf>,
    debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    directory: Option<PathBuf>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    brand_title: Option<String>,
    nav_categories: Option<Vec<String>>,
    footer_copy: Option<String>,
    secure_cookies: Option<bool>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
