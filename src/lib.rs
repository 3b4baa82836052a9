#![forbid(unsafe_code)]

pub mod cloudflare;
pub mod config;
pub mod errors;
pub mod health;
pub mod models;
pub mod relay;
pub mod slack;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
