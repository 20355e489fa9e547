//! Error types for frame decoding

use thiserror::Error;

/// Reasons an inbound frame is rejected as malformed
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame is not valid JSON or has the wrong shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Event tag is not one of the known signaling events
    #[error("Unknown event type: {0:?}")]
    UnknownEvent(String),

    /// Event tag is only ever sent by the server
    #[error("Event {0:?} cannot be sent by a client")]
    OutboundOnly(&'static str),

    /// Body carries no usable room id
    #[error("Missing or empty room id")]
    MissingRoomId,

    /// `connected` event whose body is not a client id
    #[error("Missing client id")]
    MissingClientId,

    /// Negotiation event without a payload
    #[error("Missing negotiation payload")]
    MissingPayload,
}
