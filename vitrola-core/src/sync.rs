//! Bringing (re)connecting clients back to the current state.

use log::{debug, info};

use crate::{Jukebox, Snapshot};

/// What the server knows about a single client's projection
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClientSync {
    acknowledged: Option<u64>,
}

impl ClientSync {
    /// The last revision the client is known to have applied
    pub fn acknowledged(&self) -> Option<u64> {
        self.acknowledged
    }

    /// Records an acknowledgement.
    /// Returns true if the client is too far off and must be sent a snapshot.
    pub fn acknowledge(&mut self, revision: u64, current: u64, threshold: u64) -> bool {
        self.acknowledged = Some(revision);
        is_lagging(revision, current, threshold)
    }
}

/// A client ahead of the server is talking to a restarted server
pub fn is_lagging(client: u64, server: u64, threshold: u64) -> bool {
    client > server || server - client > threshold
}

impl Jukebox {
    /// Hands a full snapshot to `deliver`.
    ///
    /// The snapshot is taken and delivered while holding the lock,
    /// so no broadcast can be ordered before it for the receiving client.
    pub fn resync<F>(&self, sync: &mut ClientSync, known: Option<u64>, deliver: F) -> u64
    where
        F: FnOnce(Snapshot),
    {
        let state = self.state.lock();
        let snapshot = state.snapshot();
        let revision = snapshot.state.revision;

        match known {
            Some(known) if known < revision => {
                info!("Client at revision {} is behind {}", known, revision)
            }
            Some(known) if known > revision => {
                info!("Client at revision {} is from before a restart", known)
            }
            _ => debug!("Sending snapshot at revision {}", revision),
        }

        deliver(snapshot);
        sync.acknowledged = Some(revision);

        revision
    }

    /// Handles a client's acknowledgement, resyncing it if it lags too far behind.
    /// Returns true if a snapshot was delivered.
    pub fn acknowledge<F>(&self, sync: &mut ClientSync, revision: u64, deliver: F) -> bool
    where
        F: FnOnce(Snapshot),
    {
        let state = self.state.lock();
        let threshold = state.config.desync_threshold;

        if !sync.acknowledge(revision, state.player.revision, threshold) {
            return false;
        }

        let snapshot = state.snapshot();
        info!(
            "Client acknowledged {}, but the jukebox is at {}. Resyncing",
            revision, snapshot.state.revision
        );

        sync.acknowledged = Some(snapshot.state.revision);
        deliver(snapshot);

        true
    }
}
