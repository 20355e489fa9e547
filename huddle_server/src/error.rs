//! Error types for the signaling relay

use huddle_protocol::{ClientId, ProtocolError};
use thiserror::Error;

/// Errors that can occur while registering, routing or delivering
#[derive(Error, Debug)]
pub enum SignalingError {
    /// A live connection already uses this id
    #[error("Client {0} is already registered")]
    DuplicateClient(ClientId),

    /// Unknown or already disconnected client
    #[error("Client {0} not found")]
    ClientNotFound(ClientId),

    /// Failed to hand a frame to the client's transport
    #[error("Failed to deliver to {client_id}: {reason}")]
    DeliveryFailed { client_id: ClientId, reason: String },

    /// Inbound frame could not be decoded
    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] ProtocolError),
}

/// Errors from a single WebSocket message
#[derive(Error, Debug)]
pub enum ClientRequestError {
    /// Connection was closed
    #[error("Connection closed")]
    Close,

    /// Binary and other non-text frames are not part of the protocol
    #[error("Unsupported message type")]
    UnsupportedType,

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The relay refused the connection
    #[error(transparent)]
    Rejected(#[from] SignalingError),
}
