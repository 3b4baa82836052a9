//! Inbound chat events and the commands parsed from them.

use serde::{Deserialize, Serialize};

use super::action::PurgeScope;

/// A chat message delivered to the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct InboundEvent {
    /// Slack user id of the author.
    pub user: String,
    /// Slack channel id the message was posted in.
    pub channel: String,
    /// Raw message text.
    pub text: String,
}

impl InboundEvent {
    /// Construct an event.
    #[must_use]
    pub fn new(
        user: impl Into<String>,
        channel: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            channel: channel.into(),
            text: text.into(),
        }
    }
}

/// Interpretation of a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show usage examples.
    Help,
    /// Confirm the requester's pending action.
    Confirm,
    /// Cancel the requester's pending action.
    Deny,
    /// Ask to purge the cache.
    ClearRequest {
        /// Purge target.
        scope: PurgeScope,
    },
    /// Not addressed to the relay.
    Unrecognized,
}
