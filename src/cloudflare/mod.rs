//! Cloudflare v4 API client used as the cache purge backend.

pub mod client;

pub use client::CloudflareClient;
