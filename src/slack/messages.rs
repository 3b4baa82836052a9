//! Reply texts posted back to requesters.
//!
//! Every reply mentions the requester so it stands out in a busy channel.

use crate::models::action::{BatchResult, PurgeScope};

/// Posted once per restricted channel when the relay comes online.
pub const READY: &str = "I'm ready! Say `help` for more information.";

fn mention(user: &str) -> String {
    format!("<@{user}>")
}

fn code_list(uris: &[String]) -> String {
    uris.iter()
        .map(|uri| format!("`{uri}`"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Usage examples.
#[must_use]
pub fn help(user: &str) -> String {
    format!(
        "{} Here's some examples of how to clear the cache:\n`clear cache`\n\
         `clear cache url1 url2 url3`\nIf I ask you to confirm, reply with `yes` or `no`!",
        mention(user)
    )
}

/// Confirmation prompt for a purge request.
#[must_use]
pub fn confirm_prompt(user: &str, scope: &PurgeScope) -> String {
    match scope {
        PurgeScope::EntireCache => format!(
            "{} I'm about to clear the entire cache, are you sure?\n\
             *Warning*: This will cause a spike in traffic to the production environment!",
            mention(user)
        ),
        PurgeScope::UriList(uris) => format!(
            "{} I'm about to clear the following cache items, are you sure?\n{}",
            mention(user),
            code_list(uris)
        ),
    }
}

/// Rejection for a request naming too many URIs.
#[must_use]
pub fn too_many_uris(user: &str, max_uris: usize) -> String {
    format!(
        "{} That's too much for one request - try again with {max_uris} URIs or fewer",
        mention(user)
    )
}

/// Acknowledgement of a confirmed request.
#[must_use]
pub fn confirmed(user: &str) -> String {
    format!("{} Ok, I'll let you know when it's done.", mention(user))
}

/// Sent when a confirmed request could not be queued for execution.
#[must_use]
pub fn not_queued(user: &str) -> String {
    format!(
        "{} Sorry, I couldn't queue that, I'm shutting down. Please try again shortly.",
        mention(user)
    )
}

/// Acknowledgement of a cancelled request.
#[must_use]
pub fn cancelled(user: &str) -> String {
    format!("{} Ok, I'll cancel that!", mention(user))
}

/// Reply to a user or channel that is not allowed to issue commands.
#[must_use]
pub fn denied(user: &str) -> String {
    format!(
        "{} Sorry, I'm not allowed to talk to you here :thinking_face:",
        mention(user)
    )
}

/// Outcome of an executed purge.
#[must_use]
pub fn result(user: &str, result: &BatchResult) -> String {
    match result {
        BatchResult::Success { cleared } if cleared.is_empty() => format!(
            "{} That's done, the entire cache has been cleared",
            mention(user)
        ),
        BatchResult::Success { cleared } => format!(
            "{} That's done, the following items have been cleared:\n{}",
            mention(user),
            code_list(cleared)
        ),
        BatchResult::Failure { error } => format!(
            "{} Sorry, that didn't work...\n*Error*: {error}",
            mention(user)
        ),
    }
}
