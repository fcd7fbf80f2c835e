//! Client events and connection state.

use viva_protocols::wire::{FunctionCall, ServerContent};
use viva_protocols::LiveError;

use crate::close::CloseCategory;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Cleanly closed; a new client is needed to reconnect.
    Closed,
    /// Terminally failed.
    Failed,
}

/// Events dispatched to the caller, in arrival order.
#[derive(Debug)]
pub enum LiveEvent {
    /// Socket open and setup sent.
    Connected,
    /// Server acknowledged the setup handshake.
    SetupComplete,
    /// A raw generated-content frame, before per-part dispatch.
    Content(ServerContent),
    /// One audio part of a model turn.
    AudioResponse { mime_type: String, data: String },
    /// One text part of a model turn.
    TextResponse(String),
    /// The model finished its turn.
    TurnComplete,
    /// The model requested tool invocations.
    ToolCall(Vec<FunctionCall>),
    /// The model cancelled previously requested tool calls.
    ToolCallCancellation(Vec<String>),
    /// A non-fatal or terminal error, per the carried variant.
    Error(LiveError),
    /// The connection is gone and will not be retried.
    Disconnected {
        code: u16,
        reason: String,
        category: CloseCategory,
    },
}
