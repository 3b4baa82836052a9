//! Purge execution for confirmed actions.
//!
//! The [`ActionExecutor`] resolves the zone id once per process and then
//! issues one purge call per action. Every remote call runs under a
//! deadline; errors become [`BatchResult::Failure`] and are never retried.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::action::{BatchResult, PurgeScope, QueuedAction};
use crate::{AppError, Result};

/// Remote cache provider operations.
pub trait PurgeApi: Send + Sync {
    /// Look up the zone id for a zone name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no zone matches, or
    /// [`AppError::Purge`] if the provider call fails.
    fn resolve_zone_id<'a>(
        &'a self,
        zone_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Purge every cached object in the zone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Purge`] if the provider rejects the request.
    fn purge_everything<'a>(
        &'a self,
        zone_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Purge the listed URIs in a single request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Purge`] if the provider rejects the request.
    fn purge_files<'a>(
        &'a self,
        zone_id: &'a str,
        uris: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Runs queued actions against a [`PurgeApi`].
pub struct ActionExecutor {
    api: Arc<dyn PurgeApi>,
    zone_name: String,
    zone_id: Mutex<Option<String>>,
    call_timeout: Duration,
    shutdown: CancellationToken,
}

impl ActionExecutor {
    /// Create an executor for `zone_name`.
    #[must_use]
    pub fn new(
        api: Arc<dyn PurgeApi>,
        zone_name: String,
        call_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            api,
            zone_name,
            zone_id: Mutex::new(None),
            call_timeout,
            shutdown,
        }
    }

    /// Execute one action and report its outcome.
    pub async fn execute(&self, action: &QueuedAction) -> BatchResult {
        let action_id = action.action.id.as_str();
        match self.try_execute(action.scope()).await {
            Ok(()) => {
                info!(action_id, uris = action.scope().uris().len(), "purge succeeded");
                BatchResult::Success {
                    cleared: action.scope().uris().to_vec(),
                }
            }
            Err(err) => {
                warn!(action_id, %err, "purge failed");
                BatchResult::Failure {
                    error: err.to_string(),
                }
            }
        }
    }

    /// Forget the memoized zone id so the next execution looks it up again.
    pub async fn invalidate_zone(&self) {
        self.zone_id.lock().await.take();
    }

    async fn try_execute(&self, scope: &PurgeScope) -> Result<()> {
        let zone_id = self.zone_id().await?;
        match scope {
            PurgeScope::EntireCache => {
                info!("purging entire cache");
                self.with_deadline("purge everything", self.api.purge_everything(&zone_id))
                    .await
            }
            PurgeScope::UriList(uris) => {
                info!(count = uris.len(), "purging uri list");
                self.with_deadline("purge files", self.api.purge_files(&zone_id, uris))
                    .await
            }
        }
    }

    async fn zone_id(&self) -> Result<String> {
        let mut cached = self.zone_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }
        if self.shutdown.is_cancelled() {
            return Err(AppError::ShuttingDown(
                "zone id not resolved before shutdown".into(),
            ));
        }
        let id = self
            .with_deadline("resolve zone", self.api.resolve_zone_id(&self.zone_name))
            .await?;
        info!(zone = %self.zone_name, zone_id = %id, "resolved zone id");
        *cached = Some(id.clone());
        Ok(id)
    }

    async fn with_deadline<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "{operation} did not complete within {}s",
                    self.call_timeout.as_secs()
                ))
            })?
    }
}
