use crossbeam::channel::Sender;

use crate::{ClientRole, ServerMessage};

/// Describes who should receive a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    All,
    /// Only clients with the given role
    Only(ClientRole),
    /// Every client except those with the given role
    Except(ClientRole),
}

impl Recipients {
    pub fn includes(&self, role: ClientRole) -> bool {
        match self {
            Recipients::All => true,
            Recipients::Only(r) => *r == role,
            Recipients::Except(r) => *r != role,
        }
    }
}

/// Fans messages out to connected clients.
///
/// The jukebox calls this while holding its state lock,
/// so implementors must only enqueue and never block.
pub trait Broadcaster: Send + Sync + 'static {
    fn broadcast(&self, message: ServerMessage, recipients: Recipients);
}

impl Broadcaster for Sender<(ServerMessage, Recipients)> {
    fn broadcast(&self, message: ServerMessage, recipients: Recipients) {
        // A dropped receiver only means nobody is listening anymore
        let _ = self.send((message, recipients));
    }
}
