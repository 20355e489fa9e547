//! Boundary between the transport and the router
//!
//! The transport reports connects, text frames and disconnects here; frames
//! are decoded into [`SignalingMessage`]s before the router sees them, so a
//! malformed frame never reaches room or connection state.

use crate::error::SignalingError;
use crate::registry::ClientHandle;
use crate::router::{Delivery, SignalingRouter};
use huddle_protocol::{ClientId, ProtocolError, ServerEvent, SignalingMessage};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct EventDispatcher {
    router: Arc<SignalingRouter>,
}

impl EventDispatcher {
    pub fn new(router: Arc<SignalingRouter>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Arc<SignalingRouter> {
        &self.router
    }

    pub fn decode(frame: &str) -> Result<SignalingMessage, ProtocolError> {
        frame.parse()
    }

    pub fn encode(event: &ServerEvent) -> String {
        event.to_string()
    }

    pub fn on_connect(&self, handle: ClientHandle) -> Result<ClientId, SignalingError> {
        self.router.connect(handle)
    }

    /// Decode and route one inbound frame.
    ///
    /// A malformed frame is logged and returned as an error with no other
    /// effect; the connection stays open either way.
    pub fn on_message(&self, client_id: &ClientId, frame: &str) -> Result<Delivery, SignalingError> {
        let message = Self::decode(frame).map_err(|e| {
            warn!(client = %client_id, error = %e, "rejected malformed frame");
            SignalingError::MalformedMessage(e)
        })?;
        self.router.route(client_id, message)
    }

    pub fn on_disconnect(&self, client_id: &ClientId) {
        self.router.disconnect(client_id);
    }
}
