//! Slack Socket Mode client with a small buffered send queue.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use slack_morphism::prelude::{
    SlackApiChatPostMessageRequest, SlackApiConversationsListRequest, SlackApiToken,
    SlackApiTokenType, SlackApiTokenValue, SlackApiUsersListRequest, SlackChannelId, SlackClient,
    SlackClientEventsListenerEnvironment, SlackClientHyperHttpsConnector, SlackClientSession,
    SlackClientSocketModeConfig, SlackClientSocketModeListener, SlackConversationType,
    SlackCursorId, SlackMessageContent, SlackSocketModeListenerCallbacks,
};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::models::command::InboundEvent;
use crate::relay::access::DirectoryEntry;
use crate::relay::notifier::Notifier;
use crate::slack::events;
use crate::{config::SlackConfig, AppError, Result};

const QUEUE_CAPACITY: usize = 256;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
const MAX_SEND_ATTEMPTS: u32 = 5;
const DIRECTORY_PAGE_SIZE: u16 = 200;

/// Message to be delivered to Slack via chat.postMessage.
#[derive(Debug, Clone)]
pub struct SlackMessage {
    pub channel: SlackChannelId,
    pub text: String,
}

impl SlackMessage {
    /// Create a plain-text message for a channel.
    pub fn plain(channel: SlackChannelId, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
        }
    }

    fn into_request(self) -> SlackApiChatPostMessageRequest {
        let content = SlackMessageContent {
            text: Some(self.text),
            blocks: None,
            attachments: None,
            upload: None,
            files: None,
            reactions: None,
            metadata: None,
            markdown_text: None,
        };

        SlackApiChatPostMessageRequest {
            channel: self.channel,
            content,
            as_user: None,
            icon_emoji: None,
            icon_url: None,
            link_names: Some(true),
            parse: None,
            thread_ts: None,
            username: None,
            reply_broadcast: None,
            unfurl_links: None,
            unfurl_media: None,
        }
    }
}

/// Slack Socket Mode wrapper that owns a rate-limited outgoing queue.
pub struct SlackService {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
    queue_tx: mpsc::Sender<SlackMessage>,
}

/// Join handles for Slack background tasks.
pub struct SlackRuntime {
    pub queue_task: JoinHandle<()>,
    pub socket_task: JoinHandle<()>,
}

impl SlackService {
    /// Start the Slack client, the background sender task, and the Socket
    /// Mode listener that forwards channel messages into `inbound_tx`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn start(
        config: &SlackConfig,
        inbound_tx: mpsc::Sender<InboundEvent>,
    ) -> Result<(Self, SlackRuntime)> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = Arc::new(SlackClient::new(connector));
        let bot_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.bot_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::Bot),
        };
        let app_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.app_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::App),
        };

        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue_task = Self::spawn_worker(client.clone(), bot_token.clone(), queue_rx);
        let socket_task = Self::spawn_socket_mode(&client, app_token, inbound_tx);

        info!("slack service started with buffered queue and socket mode");

        Ok((
            Self {
                client,
                bot_token,
                queue_tx,
            },
            SlackRuntime {
                queue_task,
                socket_task,
            },
        ))
    }

    /// Enqueue a message for async delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the sender task has exited.
    pub async fn enqueue(&self, message: SlackMessage) -> Result<()> {
        self.queue_tx
            .send(message)
            .await
            .map_err(|err| AppError::Slack(format!("failed to enqueue slack message: {err}")))
    }

    fn spawn_worker(
        client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
        token: SlackApiToken,
        mut queue_rx: mpsc::Receiver<SlackMessage>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let session = client.open_session(&token);
            while let Some(message) = queue_rx.recv().await {
                let request = message.into_request();
                let mut backoff = INITIAL_RETRY_DELAY;
                let mut attempt = 1;
                loop {
                    match session.chat_post_message(&request).await {
                        Ok(_) => {
                            info!("sent slack message");
                            break;
                        }
                        Err(error) if attempt >= MAX_SEND_ATTEMPTS => {
                            error!(?error, attempt, "slack post failed; giving up");
                            break;
                        }
                        Err(error) => {
                            let delay = match &error {
                                slack_morphism::errors::SlackClientError::RateLimitError(rate) => {
                                    rate.retry_after.unwrap_or(backoff)
                                }
                                _ => backoff,
                            };
                            warn!(?error, delay=?delay, "slack post failed; retrying");
                            sleep(delay).await;
                            backoff = (backoff * 2).min(MAX_RETRY_DELAY);
                            attempt += 1;
                        }
                    }
                }
            }
            info!("slack sender task exiting");
        })
    }

    fn spawn_socket_mode(
        client: &Arc<SlackClient<SlackClientHyperHttpsConnector>>,
        app_token: SlackApiToken,
        inbound_tx: mpsc::Sender<InboundEvent>,
    ) -> JoinHandle<()> {
        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(client))
                .with_error_handler(|err, _client, _state| {
                    error!(?err, "socket mode error");
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR
                })
                .with_user_state(inbound_tx),
        );
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_hello_events(|event, _client, _state| async move {
                info!(?event, "socket hello");
            })
            .with_push_events(events::handle_push_event);
        let config = SlackClientSocketModeConfig {
            max_connections_count: SlackClientSocketModeConfig::DEFAULT_CONNECTIONS_COUNT,
            debug_connections: SlackClientSocketModeConfig::DEFAULT_DEBUG_CONNECTIONS,
            initial_backoff_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_INITIAL_BACKOFF_IN_SECONDS,
            reconnect_timeout_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_RECONNECT_TIMEOUT_IN_SECONDS,
            ping_interval_in_seconds: SlackClientSocketModeConfig::DEFAULT_PING_INTERVAL_IN_SECONDS,
            ping_failure_threshold_times:
                SlackClientSocketModeConfig::DEFAULT_PING_FAILURE_THRESHOLD_TIMES,
        };

        let listener = SlackClientSocketModeListener::new(&config, listener_env, callbacks);
        tokio::spawn(async move {
            if let Err(error) = listener.listen_for(&app_token).await {
                error!(?error, "socket mode listen failed");
                return;
            }

            listener.serve().await;
            info!("socket mode listener exited");
        })
    }

    /// Create an HTTP session for direct API calls using the bot token.
    #[must_use]
    pub fn http_session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.bot_token)
    }

    /// User id of the bot itself, used to skip its own messages.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the token is rejected.
    pub async fn bot_user_id(&self) -> Result<String> {
        self.http_session()
            .auth_test()
            .await
            .map(|response| response.user_id.to_string())
            .map_err(|err| AppError::Slack(format!("auth test failed: {err}")))
    }

    /// Every public and private channel visible to the bot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if a page cannot be fetched.
    pub async fn list_channels(&self) -> Result<Vec<DirectoryEntry>> {
        let session = self.http_session();
        let mut entries = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;
        loop {
            let mut request = SlackApiConversationsListRequest::new()
                .with_limit(DIRECTORY_PAGE_SIZE)
                .with_exclude_archived(true)
                .with_types(vec![
                    SlackConversationType::Public,
                    SlackConversationType::Private,
                ]);
            if let Some(next) = cursor.take() {
                request = request.with_cursor(next);
            }
            let response = session
                .conversations_list(&request)
                .await
                .map_err(|err| AppError::Slack(format!("failed to list channels: {err}")))?;
            entries.extend(response.channels.into_iter().filter_map(|channel| {
                channel
                    .name
                    .map(|name| DirectoryEntry::new(channel.id.to_string(), name))
            }));
            cursor = next_cursor(response.response_metadata.and_then(|m| m.next_cursor));
            if cursor.is_none() {
                return Ok(entries);
            }
        }
    }

    /// Every user in the workspace.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if a page cannot be fetched.
    pub async fn list_users(&self) -> Result<Vec<DirectoryEntry>> {
        let session = self.http_session();
        let mut entries = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;
        loop {
            let mut request = SlackApiUsersListRequest::new().with_limit(DIRECTORY_PAGE_SIZE);
            if let Some(next) = cursor.take() {
                request = request.with_cursor(next);
            }
            let response = session
                .users_list(&request)
                .await
                .map_err(|err| AppError::Slack(format!("failed to list users: {err}")))?;
            entries.extend(response.members.into_iter().filter_map(|user| {
                user.name
                    .map(|name| DirectoryEntry::new(user.id.to_string(), name))
            }));
            cursor = next_cursor(response.response_metadata.and_then(|m| m.next_cursor));
            if cursor.is_none() {
                return Ok(entries);
            }
        }
    }
}

fn next_cursor(cursor: Option<SlackCursorId>) -> Option<SlackCursorId> {
    cursor.filter(|c| !c.0.is_empty())
}

impl Notifier for SlackService {
    fn notify(
        &self,
        channel: &str,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let message = SlackMessage::plain(SlackChannelId(channel.to_owned()), text);
        Box::pin(self.enqueue(message))
    }
}
