//! Outbound text sink.

use std::future::Future;
use std::pin::Pin;

use crate::Result;

/// Posts plain text to a chat channel.
///
/// Delivery is best-effort: callers log failures and carry on.
pub trait Notifier: Send + Sync {
    /// Post `text` to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Slack`](crate::AppError::Slack) if the message
    /// cannot be handed to the transport.
    fn notify(
        &self,
        channel: &str,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
