//! # Viva Live
//!
//! Streaming session client for the live voice/text AI endpoint.
//!
//! One [`LiveClient`] owns one bidirectional WebSocket connection:
//! connect and handshake, send audio/text, dispatch inbound frames to a
//! [`LiveEvent`] channel, heartbeat, reconnect with exponential backoff,
//! disconnect. Clients are constructed explicitly from a [`LiveConfig`];
//! there is no ambient transport state.

pub mod client;
pub mod close;
pub mod config;
pub mod events;

pub use client::LiveClient;
pub use close::{classify_close, CloseCategory, CloseDisposition};
pub use config::{LiveConfig, ReconnectConfig};
pub use events::{ConnectionState, LiveEvent};
