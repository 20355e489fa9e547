//! Routing of typed signaling events to room members
//!
//! No ordering between events is enforced beyond `join` needing a live
//! connection. Every other event is broadcast to the whole room, sender
//! included; clients ignore their own echoes.

use crate::directory::RoomDirectory;
use crate::dispatcher::EventDispatcher;
use crate::error::SignalingError;
use crate::registry::{ClientHandle, ConnectionRegistry};
use huddle_protocol::{ClientId, RoomId, ServerEvent, SignalingMessage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Members in the room snapshot
    pub recipients: usize,
    /// Members whose transport accepted the frame
    pub delivered: usize,
}

impl Delivery {
    pub fn failed(&self) -> usize {
        self.recipients - self.delivered
    }
}

/// Shared routing state, constructed once and kept for the process lifetime
#[derive(Debug)]
pub struct SignalingRouter {
    registry: ConnectionRegistry,
}

impl Default for SignalingRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingRouter {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn rooms(&self) -> &RoomDirectory {
        self.registry.rooms()
    }

    /// Register a new connection under a fresh id and greet it
    pub fn connect(&self, handle: ClientHandle) -> Result<ClientId, SignalingError> {
        let client_id = ClientId::generate();
        self.connect_as(client_id.clone(), handle)?;
        Ok(client_id)
    }

    /// Register a connection under a caller-chosen id and greet it
    pub fn connect_as(&self, client_id: ClientId, handle: ClientHandle) -> Result<(), SignalingError> {
        self.registry.register(client_id.clone(), handle)?;
        info!(client = %client_id, "client connected");

        let greeting = EventDispatcher::encode(&ServerEvent::Connected(client_id.clone()));
        if let Err(e) = self.registry.send(&client_id, Arc::from(greeting)) {
            warn!(client = %client_id, error = %e, "failed to send connected event");
        }
        Ok(())
    }

    /// Transport-level disconnect: leave every room, then drop the connection
    pub fn disconnect(&self, client_id: &ClientId) -> bool {
        let removed = self.registry.unregister(client_id);
        if removed {
            info!(client = %client_id, "client disconnected");
        }
        removed
    }

    /// Apply one inbound event from `sender`
    pub fn route(
        &self,
        sender: &ClientId,
        message: SignalingMessage,
    ) -> Result<Delivery, SignalingError> {
        match message {
            SignalingMessage::Join(room_id) => {
                let added = self.registry.join_room(sender, &room_id)?;
                info!(client = %sender, room = %room_id, new_member = added, "joined room");
                Ok(Delivery::default())
            }
            SignalingMessage::Call(_)
            | SignalingMessage::Accept(_)
            | SignalingMessage::Offer(_)
            | SignalingMessage::Answer(_)
            | SignalingMessage::Candidate(_)
            | SignalingMessage::Disconnected(_) => {
                let room_id = message.room_id().clone();
                let kind = message.kind();
                let delivery = self.broadcast(&room_id, &ServerEvent::Relay(message));
                debug!(
                    client = %sender,
                    room = %room_id,
                    event = %kind,
                    recipients = delivery.recipients,
                    delivered = delivery.delivered,
                    "relayed event"
                );
                Ok(delivery)
            }
        }
    }

    /// Send `event` to every current member of the room.
    ///
    /// Members are snapshotted first and the directory lock is released before
    /// any write. A failed write is logged and does not stop the fan-out; an
    /// unknown room has no members and delivers nothing.
    pub fn broadcast(&self, room_id: &RoomId, event: &ServerEvent) -> Delivery {
        let members = self.rooms().members_of(room_id);
        if members.is_empty() {
            return Delivery::default();
        }

        let frame: Arc<str> = Arc::from(EventDispatcher::encode(event));
        let mut delivery = Delivery {
            recipients: members.len(),
            delivered: 0,
        };
        for member in &members {
            match self.registry.send(member, Arc::clone(&frame)) {
                Ok(()) => delivery.delivered += 1,
                Err(e) => {
                    warn!(room = %room_id, client = %member, error = %e, "failed to relay event")
                }
            }
        }
        delivery
    }
}
