//! Pending, queued, and executed purge actions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a purge targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "uris", rename_all = "snake_case")]
pub enum PurgeScope {
    /// Everything cached for the zone.
    EntireCache,
    /// An explicit, ordered list of URIs. Never empty.
    UriList(Vec<String>),
}

impl PurgeScope {
    /// URIs targeted by this scope; empty for the entire cache.
    #[must_use]
    pub fn uris(&self) -> &[String] {
        match self {
            Self::EntireCache => &[],
            Self::UriList(uris) => uris,
        }
    }
}

/// A destructive request awaiting the requester's `yes` or `no`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PendingAction {
    /// Unique identifier, used for log correlation.
    pub id: String,
    /// Slack user id of the requester.
    pub requester: String,
    /// Slack channel id the request came from.
    pub channel: String,
    /// Purge target.
    pub scope: PurgeScope,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PendingAction {
    /// Construct a new pending action stamped with the current time.
    #[must_use]
    pub fn new(requester: String, channel: String, scope: PurgeScope) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            requester,
            channel,
            scope,
            created_at: Utc::now(),
        }
    }

    /// Whether the action is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return false;
        };
        now - self.created_at >= ttl
    }

    /// Mark this action as confirmed, handing it to the batch queue.
    #[must_use]
    pub fn confirm(self) -> QueuedAction {
        QueuedAction {
            action: self,
            queued_at: Utc::now(),
        }
    }
}

/// A confirmed action waiting for the next drain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct QueuedAction {
    /// The confirmed request.
    pub action: PendingAction,
    /// Confirmation timestamp.
    pub queued_at: DateTime<Utc>,
}

impl QueuedAction {
    /// Slack user id of the requester.
    #[must_use]
    pub fn requester(&self) -> &str {
        &self.action.requester
    }

    /// Slack channel id results are reported to.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.action.channel
    }

    /// Purge target.
    #[must_use]
    pub fn scope(&self) -> &PurgeScope {
        &self.action.scope
    }
}

/// Outcome of executing one queued action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResult {
    /// The purge was accepted; `cleared` is empty for an entire-cache purge.
    Success {
        /// URIs that were purged.
        cleared: Vec<String>,
    },
    /// The purge failed or timed out.
    Failure {
        /// Human-readable failure description.
        error: String,
    },
}

impl BatchResult {
    /// Whether the action succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
