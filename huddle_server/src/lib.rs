//! Room-scoped WebRTC signaling relay
//!
//! Clients connect over WebSocket, join named rooms and exchange session
//! negotiation messages (offers, answers, ICE candidates) with the other
//! members of those rooms. The relay never touches media; it only tracks who
//! is in which room and fans events out.
//!
//! # Components
//!
//! - [`ConnectionRegistry`]: live connections keyed by client id
//! - [`RoomDirectory`]: room membership, rooms dissolve when empty
//! - [`SignalingRouter`]: applies inbound events and broadcasts to rooms
//! - [`EventDispatcher`]: decodes transport frames and calls the router
//!
//! # Protocol
//!
//! Frames are JSON text messages, see [`huddle_protocol`]:
//!
//! ```json
//! {"event": "join", "data": "room-1"}
//! {"event": "offer", "data": {"roomId": "room-1", "payload": {"type": "offer", "sdp": "..."}}}
//! ```
//!
//! Every event other than `join` is broadcast to all members of its room,
//! including the sender.
//!
//! # Example
//!
//! ```bash
//! huddle-server --host 127.0.0.1 --port 8081
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod registry;
pub mod router;
pub mod server;

pub use config::RelayConfig;
pub use directory::RoomDirectory;
pub use dispatcher::EventDispatcher;
pub use error::{ClientRequestError, SignalingError};
pub use registry::{ClientHandle, ConnectionRegistry};
pub use router::{Delivery, SignalingRouter};
pub use server::RelayServer;
