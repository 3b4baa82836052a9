//! Chat text to [`Command`] parsing.

use regex::Regex;

use crate::models::action::PurgeScope;
use crate::models::command::Command;
use crate::{AppError, Result};

/// URIs eligible for purging: http(s) with a lowercase host/path.
const URI_PATTERN: &str = r"https?://[a-z0-9./]+";

/// Trigger phrase for purge requests.
const CLEAR_PHRASE: &str = "clear cache";

/// Stateless parser for inbound message text.
#[derive(Debug, Clone)]
pub struct Interpreter {
    uri_pattern: Regex,
    max_uris: usize,
}

impl Interpreter {
    /// Build an interpreter accepting at most `max_uris` URIs per request.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the URI pattern fails to compile.
    pub fn new(max_uris: usize) -> Result<Self> {
        let uri_pattern = Regex::new(URI_PATTERN)
            .map_err(|err| AppError::Config(format!("invalid uri pattern: {err}")))?;
        Ok(Self {
            uri_pattern,
            max_uris,
        })
    }

    /// Maximum URIs accepted in one request.
    #[must_use]
    pub fn max_uris(&self) -> usize {
        self.max_uris
    }

    /// Classify a message.
    ///
    /// `help`, `yes` and `no` must make up the whole message (ignoring case
    /// and surrounding whitespace). Any message mentioning `clear cache` is a
    /// purge request whose URIs are taken, in order, from the original text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SizeLimit` when a purge request names more than
    /// `max_uris` URIs.
    pub fn interpret(&self, text: &str) -> Result<Command> {
        let normalized = text.trim().to_lowercase();
        match normalized.as_str() {
            "help" => return Ok(Command::Help),
            "yes" => return Ok(Command::Confirm),
            "no" => return Ok(Command::Deny),
            _ => {}
        }

        if !normalized.contains(CLEAR_PHRASE) {
            return Ok(Command::Unrecognized);
        }

        let uris: Vec<String> = self
            .uri_pattern
            .find_iter(text)
            .map(|m| m.as_str().to_owned())
            .collect();

        if uris.len() > self.max_uris {
            return Err(AppError::SizeLimit(format!(
                "{} uris requested, at most {} allowed",
                uris.len(),
                self.max_uris
            )));
        }

        let scope = if uris.is_empty() {
            PurgeScope::EntireCache
        } else {
            PurgeScope::UriList(uris)
        };
        Ok(Command::ClearRequest { scope })
    }
}
