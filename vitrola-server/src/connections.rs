use std::sync::{Arc, Weak};

use dashmap::DashMap;
use log::{debug, error};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use vitrola_core::{Broadcaster, ClientRole, Id, Recipients, ServerMessage};

pub type ConnectionId = Id<Connection>;

/// Keeps track of every connected socket, and fans messages out to them
pub struct ConnectionManager {
    me: Weak<Self>,
    connections: DashMap<ConnectionId, Connection>,
}

pub struct Connection {
    role: ClientRole,
    /// Serialized messages waiting to be written to the socket
    outbox: UnboundedSender<Arc<str>>,
}

/// Removes its connection from the manager when dropped
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub role: ClientRole,
    manager: Weak<ConnectionManager>,
}

impl ConnectionManager {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            connections: Default::default(),
        })
    }

    /// Registers a connection, returning its handle and the receiving end of its outbox.
    pub fn connect(&self, role: ClientRole) -> (ConnectionHandle, UnboundedReceiver<Arc<str>>) {
        let (outbox, receiver) = unbounded_channel();
        let id = ConnectionId::new();

        self.connections.insert(id, Connection { role, outbox });

        let handle = ConnectionHandle {
            id,
            role,
            manager: self.me.clone(),
        };

        (handle, receiver)
    }

    /// Sends a message to a single connection
    pub fn send_to(&self, id: ConnectionId, message: &ServerMessage) {
        let Some(text) = serialize(message) else {
            return;
        };

        if let Some(connection) = self.connections.get(&id) {
            let _ = connection.outbox.send(text);
        }
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }

    pub fn count_role(&self, role: ClientRole) -> usize {
        self.connections.iter().filter(|c| c.role == role).count()
    }

    fn disconnect(&self, id: ConnectionId) {
        self.connections.remove(&id);
    }
}

impl Broadcaster for ConnectionManager {
    fn broadcast(&self, message: ServerMessage, recipients: Recipients) {
        let Some(text) = serialize(&message) else {
            return;
        };

        for connection in self.connections.iter() {
            if !recipients.includes(connection.role) {
                continue;
            }

            // A closed outbox belongs to a socket that is going away
            if connection.outbox.send(text.clone()).is_err() {
                debug!("Connection {} is closing, skipped", connection.key());
            }
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.disconnect(self.id)
        }
    }
}

fn serialize(message: &ServerMessage) -> Option<Arc<str>> {
    match serde_json::to_string(message) {
        Ok(text) => Some(text.into()),
        Err(err) => {
            error!("Failed to serialize message: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config_message() -> ServerMessage {
        ServerMessage::ConfigUpdated {
            key: "corTema".to_string(),
            value: json!("azul"),
        }
    }

    #[tokio::test]
    async fn broadcasts_respect_recipients() {
        let manager = ConnectionManager::new();

        let (_display, mut display_outbox) = manager.connect(ClientRole::Display);
        let (_admin, mut admin_outbox) = manager.connect(ClientRole::Admin);

        manager.broadcast(config_message(), Recipients::Only(ClientRole::Admin));
        manager.broadcast(config_message(), Recipients::All);

        assert!(admin_outbox.recv().await.is_some());
        assert!(admin_outbox.recv().await.is_some());

        let text = display_outbox.recv().await.unwrap();
        assert!(text.contains("config:atualizada"));
        assert!(display_outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropping_the_handle_disconnects() {
        let manager = ConnectionManager::new();

        let (handle, _outbox) = manager.connect(ClientRole::Customer);
        let (other, mut other_outbox) = manager.connect(ClientRole::Display);

        assert_eq!(manager.count(), 2);
        assert_eq!(manager.count_role(ClientRole::Display), 1);

        drop(handle);
        assert_eq!(manager.count(), 1);

        manager.send_to(other.id, &config_message());
        assert!(other_outbox.recv().await.is_some());
    }
}
