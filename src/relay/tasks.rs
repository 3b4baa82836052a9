//! Background task joining at shutdown.

use tokio::task::JoinHandle;
use tracing::error;

/// Wait for `handle`, logging a panic or abort at error level.
///
/// Returns `true` when the task ran to completion.
pub async fn join_logged(task: &str, handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(err) => {
            error!(task, %err, "background task failed");
            false
        }
    }
}
