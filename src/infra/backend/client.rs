use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::infra::telemetry::{METRIC_BACKEND_REQUESTS, METRIC_BACKEND_REQUEST_MS};

const API_KEY_HEADER: &str = "apikey";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl BackendError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            BackendError::Http(err) => err.status(),
            BackendError::Url(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Http(err) if err.is_timeout())
    }
}

/// Thin wrapper around the hosted backend's HTTP API.
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base: Url,
    anon_key: String,
}

impl BackendClient {
    pub fn new(base: &Url, anon_key: String, timeout: Duration) -> Result<Self, BackendError> {
        let base = base.join("/")?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base,
            anon_key,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("bloghub/", env!("CARGO_PKG_VERSION"))
    }

    pub fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.base.join(path).map_err(BackendError::Url)
    }

    /// Request carrying the project key and a bearer token: the user's access
    /// token when one is given, the anonymous key otherwise.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> Result<RequestBuilder, BackendError> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(self
            .client
            .request(method, url)
            .header(API_KEY_HEADER, &self.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.anon_key)))
    }

    /// Send a request and fail on any non-success status.
    pub async fn send(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, BackendError> {
        let started = Instant::now();
        let outcome = request.send().await;
        histogram!(METRIC_BACKEND_REQUEST_MS, "service" => service)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                counter!(METRIC_BACKEND_REQUESTS, "service" => service, "outcome" => "error")
                    .increment(1);
                warn!(target = "bloghub::backend", service, error = %err, "backend unreachable");
                return Err(err.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            counter!(METRIC_BACKEND_REQUESTS, "service" => service, "outcome" => "ok")
                .increment(1);
            debug!(
                target = "bloghub::backend",
                service,
                status = status.as_u16(),
                "backend request"
            );
            return Ok(response);
        }

        counter!(METRIC_BACKEND_REQUESTS, "service" => service, "outcome" => "rejected")
            .increment(1);
        let body = response.text().await.unwrap_or_default();
        debug!(
            target = "bloghub::backend",
            service,
            status = status.as_u16(),
            body = %body,
            "backend rejected request"
        );
        Err(BackendError::Status { status, body })
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(service, request).await?;
        Ok(response.json::<T>().await?)
    }
}
