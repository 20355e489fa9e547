//! Wire protocol for the huddle signaling relay
//!
//! Clients and the relay exchange JSON text frames, each holding one event
//! tag and a body:
//!
//! - `join`, `call`, `accept`, `disconnected`: body is the room id, either
//!   as a bare string or as `{"roomId": "..."}`
//! - `offer`, `answer`, `candidate`: body is `{"roomId": "...", "payload": ...}`
//!   where the payload is an SDP or ICE blob the relay never looks inside
//! - `connected`: sent by the relay only, body is the assigned client id

#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod ids;

pub use error::ProtocolError;
pub use event::{EventKind, Negotiation, ServerEvent, SignalingMessage};
pub use ids::{ClientId, RoomId};
