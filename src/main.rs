#![forbid(unsafe_code)]

//! `purge-relay`: Slack-driven cache purge relay binary.
//!
//! Bootstraps configuration, connects to Slack over Socket Mode, resolves
//! the allowed channels and users, and runs the event consumer, the batch
//! drain loop, the confirmation expiry sweep, and the health endpoint until
//! a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use purge_relay::cloudflare::CloudflareClient;
use purge_relay::config::GlobalConfig;
use purge_relay::health;
use purge_relay::relay::access::AccessContext;
use purge_relay::relay::confirmation::{spawn_expiry_task, ConfirmationStore};
use purge_relay::relay::dispatcher::{spawn_event_consumer, Dispatcher};
use purge_relay::relay::executor::ActionExecutor;
use purge_relay::relay::interpreter::Interpreter;
use purge_relay::relay::notifier::Notifier;
use purge_relay::relay::queue::{self, DrainLoop};
use purge_relay::relay::tasks::join_logged;
use purge_relay::slack::client::SlackService;
use purge_relay::slack::messages;
use purge_relay::{AppError, Result};

const INBOUND_CAPACITY: usize = 64;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "purge-relay", about = "Slack-driven cache purge relay", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("purge-relay bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Connect to Slack ────────────────────────────────
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
    let (slack, slack_runtime) = SlackService::start(&config.slack, inbound_tx).map_err(|err| {
        error!(%err, "slack service start failed");
        err
    })?;
    let slack = Arc::new(slack);

    let bot_user_id = slack.bot_user_id().await?;
    let channels = slack.list_channels().await?;
    let users = slack.list_users().await?;
    let access = AccessContext::resolve(
        &config.slack.restricted_channels,
        &config.authorised_users,
        &channels,
        &users,
    );
    info!(
        %bot_user_id,
        channels = access.channels().len(),
        users = access.users().len(),
        "access context resolved"
    );
    if access.channels().is_empty() || access.users().is_empty() {
        warn!("no channel or user resolved; every command will be denied");
    }

    let notifier: Arc<dyn Notifier> = slack.clone();
    for channel in access.channels() {
        if let Err(err) = notifier.notify(channel, messages::READY.to_owned()).await {
            warn!(%channel, %err, "failed to post ready notice");
        }
    }

    // ── Build the relay ─────────────────────────────────
    let ct = CancellationToken::new();
    let store = ConfirmationStore::new(config.relay.pending_ttl());
    let expiry_handle = spawn_expiry_task(
        store.clone(),
        config.relay.expiry_sweep_interval(),
        ct.clone(),
    );

    let purge_api = Arc::new(CloudflareClient::new(&config.cloudflare)?);
    let executor = Arc::new(ActionExecutor::new(
        purge_api,
        config.cloudflare.zone.clone(),
        config.relay.purge_timeout(),
        ct.clone(),
    ));

    let (batch_tx, batch_rx) = queue::channel(config.relay.queue_capacity);
    let drain_handle = DrainLoop::new(
        batch_rx,
        executor,
        Arc::clone(&notifier),
        config.relay.drain_interval(),
        ct.clone(),
    )
    .spawn();
    info!(
        interval_secs = config.relay.drain_interval_seconds,
        "drain loop started"
    );

    let dispatcher = Dispatcher::new(
        access,
        Interpreter::new(config.relay.max_uris)?,
        store,
        batch_tx,
        Arc::clone(&notifier),
    )
    .with_bot_user_id(bot_user_id);
    let consumer_handle = spawn_event_consumer(inbound_rx, Arc::new(dispatcher), ct.clone());

    let health_handle = if config.http_port == 0 {
        None
    } else {
        let health_ct = ct.clone();
        let port = config.http_port;
        Some(tokio::spawn(async move {
            if let Err(err) = health::serve_health(port, health_ct).await {
                error!(%err, "health endpoint failed");
            }
        }))
    };

    info!("purge-relay ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    // ── Wait for background tasks ───────────────────────
    tokio::join!(
        join_logged("event_consumer", consumer_handle),
        join_logged("drain_loop", drain_handle),
        join_logged("confirmation_expiry", expiry_handle),
    );
    if let Some(handle) = health_handle {
        join_logged("health", handle).await;
    }
    slack_runtime.socket_task.abort();
    drop(notifier);
    drop(slack);
    join_logged("slack_sender", slack_runtime.queue_task).await;
    info!("purge-relay shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
