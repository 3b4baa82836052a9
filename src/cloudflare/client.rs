//! Minimal Cloudflare v4 client covering zone lookup and cache purge.

use std::future::Future;
use std::pin::Pin;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CloudflareConfig;
use crate::relay::executor::PurgeApi;
use crate::{AppError, Result};

/// One entry of the `errors` array in an API envelope.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiMessage {
    /// Provider error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

/// Standard response envelope returned by every v4 endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Whether the call succeeded.
    pub success: bool,
    /// Errors reported by the provider.
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    /// Endpoint-specific payload.
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    /// Convert the envelope into its payload, failing when the provider
    /// reports any error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Purge` with the joined provider messages.
    pub fn into_result(self) -> Result<Option<T>> {
        if self.success && self.errors.is_empty() {
            return Ok(self.result);
        }
        let detail = if self.errors.is_empty() {
            "request unsuccessful".to_owned()
        } else {
            self.errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ")
        };
        Err(AppError::Purge(detail))
    }
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

/// Body of a `purge_cache` request.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PurgeRequest<'a> {
    /// `{"purge_everything": true}`
    Everything {
        /// Always `true`.
        purge_everything: bool,
    },
    /// `{"files": [...]}`
    Files {
        /// URIs to purge.
        files: &'a [String],
    },
}

/// HTTP client bound to one account's credentials.
pub struct CloudflareClient {
    http: reqwest::Client,
    api_base: String,
    email: Option<String>,
    api_key: String,
}

impl CloudflareClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed
    /// or no API key was loaded.
    pub fn new(config: &CloudflareConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::Config("cloudflare api key not loaded".into()));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            email: config.email.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.email {
            Some(email) => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", &self.api_key),
            None => request.bearer_auth(&self.api_key),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, "cloudflare response received");
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|err| {
            AppError::Purge(format!(
                "unexpected response ({status}): {err}: {}",
                body.chars().take(200).collect::<String>()
            ))
        })?;
        envelope.into_result()
    }

    async fn purge(&self, zone_id: &str, body: PurgeRequest<'_>) -> Result<()> {
        let url = format!("{}/zones/{zone_id}/purge_cache", self.api_base);
        self.send::<serde_json::Value>(self.http.post(url).json(&body))
            .await
            .map(|_| ())
    }
}

impl PurgeApi for CloudflareClient {
    fn resolve_zone_id<'a>(
        &'a self,
        zone_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let url = reqwest::Url::parse_with_params(
                &format!("{}/zones", self.api_base),
                &[("name", zone_name)],
            )
            .map_err(|err| AppError::Config(format!("invalid cloudflare api base: {err}")))?;
            let zones: Vec<Zone> = self.send(self.http.get(url)).await?.unwrap_or_default();
            zones
                .into_iter()
                .next()
                .map(|zone| zone.id)
                .ok_or_else(|| AppError::NotFound(format!("zone {zone_name} not found")))
        })
    }

    fn purge_everything<'a>(
        &'a self,
        zone_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.purge(
            zone_id,
            PurgeRequest::Everything {
                purge_everything: true,
            },
        ))
    }

    fn purge_files<'a>(
        &'a self,
        zone_id: &'a str,
        uris: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.purge(zone_id, PurgeRequest::Files { files: uris }))
    }
}
