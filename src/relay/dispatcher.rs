//! Inbound event handling: access check, interpretation, and the
//! confirm/deny state transitions.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::models::action::{PendingAction, PurgeScope};
use crate::models::command::{Command, InboundEvent};
use crate::relay::access::AccessContext;
use crate::relay::confirmation::ConfirmationStore;
use crate::relay::interpreter::Interpreter;
use crate::relay::notifier::Notifier;
use crate::relay::queue::BatchSender;
use crate::slack::messages;
use crate::AppError;

/// Routes each inbound event to the matching state transition.
pub struct Dispatcher {
    access: AccessContext,
    interpreter: Interpreter,
    store: ConfirmationStore,
    queue: BatchSender,
    notifier: Arc<dyn Notifier>,
    bot_user_id: Option<String>,
}

impl Dispatcher {
    /// Assemble a dispatcher.
    #[must_use]
    pub fn new(
        access: AccessContext,
        interpreter: Interpreter,
        store: ConfirmationStore,
        queue: BatchSender,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            access,
            interpreter,
            store,
            queue,
            notifier,
            bot_user_id: None,
        }
    }

    /// Ignore events authored by `bot_user_id` (the relay's own posts).
    #[must_use]
    pub fn with_bot_user_id(mut self, bot_user_id: impl Into<String>) -> Self {
        self.bot_user_id = Some(bot_user_id.into());
        self
    }

    /// Handle a single inbound event to completion.
    pub async fn handle(&self, event: InboundEvent) {
        if self.bot_user_id.as_deref() == Some(event.user.as_str()) {
            return;
        }

        if !self.access.authorize(&event) {
            warn!(
                user = %event.user,
                channel = %event.channel,
                "command from unauthorised user or channel"
            );
            self.reply(&event.channel, messages::denied(&event.user))
                .await;
            return;
        }

        match self.interpreter.interpret(&event.text) {
            Ok(Command::Help) => {
                self.reply(&event.channel, messages::help(&event.user)).await;
            }
            Ok(Command::Confirm) => self.confirm(&event).await,
            Ok(Command::Deny) => self.deny(&event).await,
            Ok(Command::ClearRequest { scope }) => self.request(&event, scope).await,
            Ok(Command::Unrecognized) => {
                debug!(user = %event.user, "message ignored");
            }
            Err(AppError::SizeLimit(detail)) => {
                info!(user = %event.user, %detail, "clear request rejected");
                self.reply(
                    &event.channel,
                    messages::too_many_uris(&event.user, self.interpreter.max_uris()),
                )
                .await;
            }
            Err(err) => {
                warn!(user = %event.user, %err, "failed to interpret message");
            }
        }
    }

    async fn request(&self, event: &InboundEvent, scope: PurgeScope) {
        let prompt = messages::confirm_prompt(&event.user, &scope);
        let action = PendingAction::new(event.user.clone(), event.channel.clone(), scope);
        info!(
            action_id = %action.id,
            user = %event.user,
            uris = action.scope.uris().len(),
            "clear request awaiting confirmation"
        );
        if let Some(replaced) = self.store.set(action).await {
            info!(action_id = %replaced.id, "previous pending request replaced");
        }
        self.reply(&event.channel, prompt).await;
    }

    async fn confirm(&self, event: &InboundEvent) {
        let Some(action) = self.store.take(&event.user).await else {
            debug!(user = %event.user, "confirm with no pending request");
            return;
        };
        info!(action_id = %action.id, user = %event.user, "clear request confirmed");
        self.reply(&event.channel, messages::confirmed(&event.user))
            .await;
        if let Err(err) = self.queue.push(action.confirm()).await {
            warn!(%err, user = %event.user, "confirmed action could not be queued");
            self.reply(&event.channel, messages::not_queued(&event.user))
                .await;
        }
    }

    async fn deny(&self, event: &InboundEvent) {
        let Some(action) = self.store.remove(&event.user).await else {
            debug!(user = %event.user, "deny with no pending request");
            return;
        };
        info!(action_id = %action.id, user = %event.user, "clear request cancelled");
        self.reply(&event.channel, messages::cancelled(&event.user))
            .await;
    }

    async fn reply(&self, channel: &str, text: String) {
        if let Err(err) = self.notifier.notify(channel, text).await {
            warn!(channel, %err, "failed to post reply");
        }
    }
}

/// Spawn the task that feeds inbound events through `dispatcher` one at a
/// time, in arrival order.
#[must_use]
pub fn spawn_event_consumer(
    mut rx: mpsc::Receiver<InboundEvent>,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            loop {
                let event = tokio::select! {
                    () = cancel.cancelled() => {
                        info!("event consumer shutting down");
                        break;
                    }
                    maybe_event = rx.recv() => {
                        if let Some(e) = maybe_event { e } else {
                            info!("inbound event channel closed");
                            break;
                        }
                    }
                };
                dispatcher.handle(event).await;
            }
        }
        .instrument(info_span!("event_consumer")),
    )
}
