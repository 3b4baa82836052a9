//! Per-requester store of unconfirmed purge requests.
//!
//! Each requester holds at most one [`PendingAction`]. A newer request
//! replaces the older one outright. Entries older than the configured TTL
//! read as absent and are swept by [`spawn_expiry_task`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::models::action::PendingAction;

/// Shared map from requester id to their outstanding request.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationStore {
    entries: Arc<Mutex<HashMap<String, PendingAction>>>,
    ttl: Option<Duration>,
}

impl ConfirmationStore {
    /// Create a store; `ttl` of `None` keeps entries until confirmed or denied.
    #[must_use]
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: Arc::default(),
            ttl,
        }
    }

    /// Record `action` for its requester, returning any request it replaced.
    pub async fn set(&self, action: PendingAction) -> Option<PendingAction> {
        let mut entries = self.entries.lock().await;
        let replaced = entries.insert(action.requester.clone(), action);
        replaced.filter(|old| !self.is_expired(old))
    }

    /// Current live request for `user`.
    pub async fn get(&self, user: &str) -> Option<PendingAction> {
        let entries = self.entries.lock().await;
        entries
            .get(user)
            .filter(|action| !self.is_expired(action))
            .cloned()
    }

    /// Drop the request for `user`, returning it if it was still live.
    pub async fn remove(&self, user: &str) -> Option<PendingAction> {
        let mut entries = self.entries.lock().await;
        entries
            .remove(user)
            .filter(|action| !self.is_expired(action))
    }

    /// Remove and return the live request for `user` in one step, so the
    /// caller can hand it to the batch queue without it being visible in
    /// both places.
    pub async fn take(&self, user: &str) -> Option<PendingAction> {
        self.remove(user).await
    }

    /// Delete every expired entry, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, action| !self.is_expired(action));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn is_expired(&self, action: &PendingAction) -> bool {
        self.ttl
            .is_some_and(|ttl| action.is_expired_at(Utc::now(), ttl))
    }
}

/// Spawn the background sweep that discards expired requests.
#[must_use]
pub fn spawn_expiry_task(
    store: ConfirmationStore,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("expiry task shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let dropped = store.purge_expired().await;
                        if dropped > 0 {
                            info!(dropped, "expired pending requests discarded");
                        } else {
                            debug!("no expired pending requests");
                        }
                    }
                }
            }
        }
        .instrument(info_span!("confirmation_expiry")),
    )
}
