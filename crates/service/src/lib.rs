//! Translation service client.
//!
//! Talks to an OpenAI-compatible chat completion endpoint. Configuration is
//! resolved once at startup and handed to [`ChatTranslator::new`].

pub mod client;
pub mod config;

pub use client::ChatTranslator;
pub use config::{ConfigError, ServiceConfig};
