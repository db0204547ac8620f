//! # medal-discord
//!
//! Discord transport: a gateway reader that turns dispatches into
//! [`BotEvent`](medal_core::BotEvent)s, and a REST client implementing
//! [`ChatClient`](medal_core::ChatClient).

#![deny(unsafe_code)]

pub mod backoff;
pub mod components;
pub mod error;
pub mod gateway;
pub mod payload;
pub mod rest;

pub use backoff::Backoff;
pub use error::DiscordError;
pub use gateway::{spawn_gateway, GatewayConfig, INTENTS};
pub use rest::RestClient;
