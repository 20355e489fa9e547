//! Live connections, keyed by client id

use crate::directory::RoomDirectory;
use crate::error::SignalingError;
use huddle_protocol::{ClientId, RoomId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Write side of a client's transport.
///
/// Frames go onto a bounded queue drained by the connection's writer task, so
/// a write never waits on the network.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: mpsc::Sender<Arc<str>>,
}

impl ClientHandle {
    pub fn new(tx: mpsc::Sender<Arc<str>>) -> Self {
        Self { tx }
    }

    /// Handle plus the receiving end the writer task drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    fn write(&self, client_id: &ClientId, frame: Arc<str>) -> Result<(), SignalingError> {
        self.tx.try_send(frame).map_err(|e| {
            let reason = match e {
                TrySendError::Full(_) => "outbound queue full",
                TrySendError::Closed(_) => "connection closed",
            };
            SignalingError::DeliveryFailed {
                client_id: client_id.clone(),
                reason: reason.to_string(),
            }
        })
    }
}

#[derive(Debug)]
struct ClientConnection {
    handle: ClientHandle,
    /// Most recently joined room
    current_room: Option<RoomId>,
}

/// Authoritative set of live connections.
///
/// Owns the room directory so that a connection and its memberships are added
/// and removed under the same registry lock. Lock order is always registry
/// then directory.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ClientId, ClientConnection>>,
    rooms: RoomDirectory,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of room membership; joins go through [`Self::join_room`]
    pub fn rooms(&self) -> &RoomDirectory {
        &self.rooms
    }

    pub fn register(&self, client_id: ClientId, handle: ClientHandle) -> Result<(), SignalingError> {
        let mut connections = self.connections.write();
        if connections.contains_key(&client_id) {
            return Err(SignalingError::DuplicateClient(client_id));
        }
        connections.insert(
            client_id,
            ClientConnection {
                handle,
                current_room: None,
            },
        );
        Ok(())
    }

    /// Drop the connection and all of its room memberships.
    ///
    /// Returns `false` if the client was not registered.
    pub fn unregister(&self, client_id: &ClientId) -> bool {
        let mut connections = self.connections.write();
        let left = self.rooms.leave_all(client_id);
        let removed = connections.remove(client_id).is_some();
        if removed {
            debug!(client = %client_id, rooms = left.len(), "client unregistered");
        }
        removed
    }

    /// Join a room on behalf of a live client and make it the current room.
    ///
    /// Returns `false` if the client was already a member.
    pub fn join_room(&self, client_id: &ClientId, room_id: &RoomId) -> Result<bool, SignalingError> {
        let mut connections = self.connections.write();
        let connection = connections
            .get_mut(client_id)
            .ok_or_else(|| SignalingError::ClientNotFound(client_id.clone()))?;
        connection.current_room = Some(room_id.clone());
        Ok(self.rooms.join(room_id, client_id))
    }

    /// Hand one frame to the client's transport; at most once, never retried
    pub fn send(&self, client_id: &ClientId, frame: Arc<str>) -> Result<(), SignalingError> {
        let handle = self
            .connections
            .read()
            .get(client_id)
            .map(|connection| connection.handle.clone())
            .ok_or_else(|| SignalingError::ClientNotFound(client_id.clone()))?;
        handle.write(client_id, frame)
    }

    pub fn current_room(&self, client_id: &ClientId) -> Option<RoomId> {
        self.connections
            .read()
            .get(client_id)
            .and_then(|connection| connection.current_room.clone())
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.connections.read().contains_key(client_id)
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}
