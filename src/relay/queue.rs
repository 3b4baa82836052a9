//! Batch queue and timer-driven drain loop.
//!
//! Confirmed actions are pushed into a bounded channel. The [`DrainLoop`]
//! task accumulates whatever arrives between ticks and, on each tick,
//! executes the accumulated actions as one batch in arrival order. Actions
//! confirmed while a batch is executing wait in the channel and join the
//! next batch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::models::action::QueuedAction;
use crate::relay::executor::ActionExecutor;
use crate::relay::notifier::Notifier;
use crate::slack::messages;
use crate::{AppError, Result};

/// Producer side of the batch queue.
#[derive(Debug, Clone)]
pub struct BatchSender {
    tx: mpsc::Sender<QueuedAction>,
}

impl BatchSender {
    /// Queue a confirmed action, waiting for buffer space if the queue is
    /// full.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ShuttingDown` if the drain loop has exited.
    pub async fn push(&self, action: QueuedAction) -> Result<()> {
        self.tx
            .send(action)
            .await
            .map_err(|err| AppError::ShuttingDown(format!("batch queue closed: {err}")))
    }
}

/// Create a batch queue holding up to `capacity` undrained actions.
#[must_use]
pub fn channel(capacity: usize) -> (BatchSender, mpsc::Receiver<QueuedAction>) {
    let (tx, rx) = mpsc::channel(capacity);
    (BatchSender { tx }, rx)
}

/// Accumulation state between ticks.
#[derive(Debug, Default)]
pub enum DrainState {
    /// Nothing received since the last flush.
    #[default]
    Idle,
    /// At least one action received since the last flush.
    Accumulating(Vec<QueuedAction>),
}

impl DrainState {
    /// Record an arrival.
    pub fn push(&mut self, action: QueuedAction) {
        match self {
            Self::Idle => *self = Self::Accumulating(vec![action]),
            Self::Accumulating(actions) => actions.push(action),
        }
    }

    /// Take the accumulated batch, resetting to idle. `None` when idle.
    pub fn flush(&mut self) -> Option<Vec<QueuedAction>> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Accumulating(actions) => Some(actions),
        }
    }

    /// Number of accumulated actions.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Accumulating(actions) => actions.len(),
        }
    }

    /// Whether nothing is accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Consumer side of the batch queue.
pub struct DrainLoop {
    rx: mpsc::Receiver<QueuedAction>,
    executor: Arc<ActionExecutor>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    cancel: CancellationToken,
}

impl DrainLoop {
    /// Construct the loop (does not start it).
    #[must_use]
    pub fn new(
        rx: mpsc::Receiver<QueuedAction>,
        executor: Arc<ActionExecutor>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            rx,
            executor,
            notifier,
            interval,
            cancel,
        }
    }

    /// Spawn the loop as a background task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run().instrument(info_span!("drain_loop")))
    }

    /// Run until cancelled or every sender is dropped.
    pub async fn run(mut self) {
        let mut state = DrainState::Idle;
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    if !state.is_empty() {
                        warn!(dropped = state.len(), "shutting down with undrained actions");
                    }
                    info!("drain loop shutting down");
                    break;
                }
                maybe_action = self.rx.recv() => {
                    let Some(action) = maybe_action else {
                        info!("batch queue closed");
                        if let Some(batch) = state.flush() {
                            self.execute_batch(batch).await;
                        }
                        break;
                    };
                    debug!(action_id = %action.action.id, "action queued for next batch");
                    state.push(action);
                }
                _ = ticker.tick() => {
                    if let Some(batch) = state.flush() {
                        self.execute_batch(batch).await;
                    }
                }
            }
        }
    }

    /// Execute `batch` strictly in order, reporting each result before the
    /// next action starts.
    async fn execute_batch(&self, batch: Vec<QueuedAction>) {
        info!(size = batch.len(), "draining batch");
        for action in batch {
            let result = self.executor.execute(&action).await;
            let text = messages::result(action.requester(), &result);
            if let Err(err) = self.notifier.notify(action.channel(), text).await {
                warn!(action_id = %action.action.id, %err, "failed to post purge result");
            }
        }
    }
}
