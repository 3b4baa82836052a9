//! Slack bridge layer modules.

pub mod client;
pub mod events;
pub mod messages;
