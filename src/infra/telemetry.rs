use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const METRIC_DRAFT_EDITS: &str = "bloghub_draft_edits_total";
pub const METRIC_DRAFT_WRITES: &str = "bloghub_draft_writes_total";
pub const METRIC_DRAFT_WRITE_FAILURES: &str = "bloghub_draft_write_failures_total";
pub const METRIC_BACKEND_REQUESTS: &str = "bloghub_backend_requests_total";
pub const METRIC_BACKEND_REQUEST_MS: &str = "bloghub_backend_request_ms";
pub const METRIC_IMAGE_UPLOADS: &str = "bloghub_image_uploads_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_DRAFT_EDITS,
            Unit::Count,
            "Editor changes received by the draft auto-saver."
        );
        describe_counter!(
            METRIC_DRAFT_WRITES,
            Unit::Count,
            "Drafts written after the debounce window elapsed or on flush."
        );
        describe_counter!(
            METRIC_DRAFT_WRITE_FAILURES,
            Unit::Count,
            "Draft writes rejected by the draft store."
        );
        describe_counter!(
            METRIC_BACKEND_REQUESTS,
            Unit::Count,
            "Requests sent to the hosted backend, labelled by service and outcome."
        );
        describe_histogram!(
            METRIC_BACKEND_REQUEST_MS,
            Unit::Milliseconds,
            "Latency of hosted backend requests."
        );
        describe_counter!(
            METRIC_IMAGE_UPLOADS,
            Unit::Count,
            "Images stored through the upload endpoint."
        );
    });
}
