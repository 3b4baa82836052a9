//! Channel and user allow-listing for inbound commands.

use std::collections::HashSet;

use tracing::warn;

use crate::models::command::InboundEvent;

/// A directory entry: platform id and human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Platform id (`C…` for channels, `U…` for users).
    pub id: String,
    /// Display handle.
    pub name: String,
}

impl DirectoryEntry {
    /// Construct an entry.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Resolved sets of channel and user ids permitted to issue commands.
///
/// Built once at startup; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    channels: HashSet<String>,
    users: HashSet<String>,
}

impl AccessContext {
    /// Construct directly from id sets.
    #[must_use]
    pub fn new(channels: HashSet<String>, users: HashSet<String>) -> Self {
        Self { channels, users }
    }

    /// Map configured channel and user names onto ids found in the
    /// platform directory. Names with no match are logged and skipped.
    #[must_use]
    pub fn resolve(
        channel_names: &[String],
        user_names: &[String],
        channels: &[DirectoryEntry],
        users: &[DirectoryEntry],
    ) -> Self {
        Self {
            channels: resolve_names("channel", channel_names, channels),
            users: resolve_names("user", user_names, users),
        }
    }

    /// True iff the event's channel is restricted-allowed and its author is
    /// authorised.
    #[must_use]
    pub fn authorize(&self, event: &InboundEvent) -> bool {
        self.channels.contains(&event.channel) && self.users.contains(&event.user)
    }

    /// Allowed channel ids.
    #[must_use]
    pub fn channels(&self) -> &HashSet<String> {
        &self.channels
    }

    /// Allowed user ids.
    #[must_use]
    pub fn users(&self) -> &HashSet<String> {
        &self.users
    }
}

fn resolve_names(kind: &str, names: &[String], entries: &[DirectoryEntry]) -> HashSet<String> {
    let mut ids = HashSet::new();
    for name in names {
        let mut matched = false;
        for entry in entries.iter().filter(|entry| &entry.name == name) {
            ids.insert(entry.id.clone());
            matched = true;
        }
        if !matched {
            warn!(kind, %name, "configured name not found in slack directory");
        }
    }
    ids
}
