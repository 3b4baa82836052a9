//! Socket Mode push event handler.
//!
//! Plain channel messages are converted into [`InboundEvent`]s and
//! forwarded, in delivery order, to the event consumer through the
//! `mpsc::Sender` stored in the listener's user state. Edits, joins, bot
//! posts and every other event type are ignored.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackEventCallbackBody, SlackMessageEvent, SlackPushEventCallback,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::command::InboundEvent;

/// Convert a Slack message event into an inbound command event.
///
/// Returns `None` for messages with a subtype (edits, deletions, joins),
/// messages posted by bots, and messages lacking a user or channel.
#[must_use]
pub fn inbound_from_message(message: &SlackMessageEvent) -> Option<InboundEvent> {
    if message.subtype.is_some() || message.sender.bot_id.is_some() {
        return None;
    }
    let user = message.sender.user.as_ref()?;
    let channel = message.origin.channel.as_ref()?;
    let text = message
        .content
        .as_ref()
        .and_then(|content| content.text.clone())
        .unwrap_or_default();
    Some(InboundEvent::new(user.to_string(), channel.to_string(), text))
}

/// Handle push events delivered via Socket Mode.
///
/// # Errors
///
/// Never fails; delivery problems are logged.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let SlackEventCallbackBody::Message(message) = &event.event else {
        debug!("non-message push event ignored");
        return Ok(());
    };

    let Some(inbound) = inbound_from_message(message) else {
        debug!("message event ignored");
        return Ok(());
    };

    let sender: Option<mpsc::Sender<InboundEvent>> = {
        let guard = state.read().await;
        guard.get_user_state::<mpsc::Sender<InboundEvent>>().cloned()
    };

    let Some(sender) = sender else {
        warn!("inbound event channel not available; dropping message");
        return Ok(());
    };

    if let Err(err) = sender.send(inbound).await {
        warn!(%err, "event consumer gone; dropping message");
    }
    Ok(())
}
