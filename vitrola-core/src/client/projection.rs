use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::{IdType, NowPlaying, OverlayConfig, PlayerStateView, Request, ServerMessage};

/// A client's read-only copy of the jukebox state, fed only by server messages
#[derive(Debug, Clone, Default)]
pub struct Projection {
    queue: Vec<Request>,
    current: Option<NowPlaying>,
    state: Option<PlayerStateView>,
    server_start_time: Option<DateTime<Utc>>,
    overlay: Option<OverlayConfig>,
}

/// The result of applying a server message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The projection changed.
    /// `reload_media` is set when the current item changed.
    Updated { reload_media: bool },
    /// The message is older than what was already applied, and was dropped
    StaleEvent,
    /// The message cannot be applied safely, a snapshot is needed
    DesyncDetected,
    /// The message carries no state
    Ignored,
}

impl Projection {
    pub fn queue(&self) -> &[Request] {
        &self.queue
    }

    pub fn current(&self) -> Option<&NowPlaying> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> Option<IdType> {
        self.current.as_ref().map(NowPlaying::id)
    }

    pub fn state(&self) -> Option<&PlayerStateView> {
        self.state.as_ref()
    }

    /// The last revision applied, if the client ever synced
    pub fn revision(&self) -> Option<u64> {
        self.state.as_ref().map(|s| s.revision)
    }

    pub fn server_start_time(&self) -> Option<DateTime<Utc>> {
        self.server_start_time
    }

    pub fn overlay(&self) -> Option<&OverlayConfig> {
        self.overlay.as_ref()
    }

    pub fn apply(&mut self, message: &ServerMessage) -> Applied {
        if let ServerMessage::InitialState(snapshot) = message {
            let reload_media = self.current_id() != snapshot.current.as_ref().map(NowPlaying::id);

            self.queue = snapshot.queue.clone();
            self.current = snapshot.current.clone();
            self.state = Some(snapshot.state.clone());
            self.server_start_time = Some(snapshot.server_start_time);
            self.overlay = Some(snapshot.overlay.clone());

            return Applied::Updated { reload_media };
        }

        let Some(incoming) = message.state() else {
            return Applied::Ignored;
        };

        let Some(last) = self.revision() else {
            debug!("Received {} before any snapshot", incoming.revision);
            return Applied::DesyncDetected;
        };

        if incoming.revision <= last {
            return Applied::StaleEvent;
        }

        match message {
            ServerMessage::PlayerStarted {
                track,
                state,
                queue,
            } => self.replace(Some(track.clone()), state, queue.clone()),
            ServerMessage::PlayerStopped { state, queue } => self.replace(None, state, queue.clone()),
            ServerMessage::QueueEmptied { state } => self.replace(None, state, vec![]),
            partial => {
                if incoming.current_id != self.current_id() {
                    warn!(
                        "Revision {} is about {:?}, but {:?} is current",
                        incoming.revision,
                        incoming.current_id,
                        self.current_id()
                    );
                    return Applied::DesyncDetected;
                }

                // Without the queue, a skipped revision may hide a change
                let queue = partial.queue();
                if queue.is_none() && incoming.revision != last + 1 {
                    return Applied::DesyncDetected;
                }

                if let Some(queue) = queue {
                    self.queue = queue.to_vec();
                }

                self.state = Some(incoming.clone());
                Applied::Updated {
                    reload_media: false,
                }
            }
        }
    }

    fn replace(
        &mut self,
        current: Option<NowPlaying>,
        state: &PlayerStateView,
        queue: Vec<Request>,
    ) -> Applied {
        let reload_media = self.current_id() != current.as_ref().map(NowPlaying::id);

        self.current = current;
        self.state = Some(state.clone());
        self.queue = queue;

        Applied::Updated { reload_media }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{NewRequest, PlayerStatus, Snapshot};

    fn state(status: PlayerStatus, current_id: Option<IdType>, revision: u64) -> PlayerStateView {
        PlayerStateView {
            status,
            current_id,
            ambient: false,
            volume: 80,
            revision,
        }
    }

    fn request() -> Request {
        Request::new(NewRequest::mock("a"))
    }

    fn snapshot(current: Option<Request>, revision: u64) -> ServerMessage {
        let current_id = current.as_ref().map(|r| r.id.value());

        ServerMessage::InitialState(Snapshot {
            queue: vec![],
            current: current.map(NowPlaying::Request),
            state: state(PlayerStatus::Playing, current_id, revision),
            server_start_time: Utc::now(),
            overlay: OverlayConfig::default(),
        })
    }

    #[test]
    fn needs_a_snapshot_first() {
        let mut projection = Projection::default();
        let message = ServerMessage::QueueEmptied {
            state: state(PlayerStatus::Stopped, None, 1),
        };

        assert_eq!(projection.apply(&message), Applied::DesyncDetected);
    }

    #[test]
    fn stale_messages_are_dropped() {
        let mut projection = Projection::default();
        projection.apply(&snapshot(None, 9));

        let message = ServerMessage::QueueUpdated {
            queue: vec![request()],
            state: state(PlayerStatus::Stopped, None, 5),
        };

        assert_eq!(projection.apply(&message), Applied::StaleEvent);
        assert!(projection.queue().is_empty());
        assert_eq!(projection.revision(), Some(9));
    }

    #[test]
    fn snapshot_reloads_only_when_the_current_item_changes() {
        let playing = request();
        let mut projection = Projection::default();

        assert_eq!(
            projection.apply(&snapshot(Some(playing.clone()), 4)),
            Applied::Updated { reload_media: true }
        );
        assert_eq!(
            projection.apply(&snapshot(Some(playing), 6)),
            Applied::Updated {
                reload_media: false
            }
        );
        assert_eq!(
            projection.apply(&snapshot(Some(request()), 2)),
            Applied::Updated { reload_media: true },
            "snapshots always apply, even after a server restart"
        );
    }

    #[test]
    fn gaps_in_partial_messages_are_desyncs() {
        let playing = request();
        let id = playing.id.value();

        let mut projection = Projection::default();
        projection.apply(&snapshot(Some(playing), 4));

        let paused = ServerMessage::PlayerPaused {
            state: state(PlayerStatus::Paused, Some(id), 6),
        };
        assert_eq!(projection.apply(&paused), Applied::DesyncDetected);

        let paused = ServerMessage::PlayerPaused {
            state: state(PlayerStatus::Paused, Some(id), 5),
        };
        assert_eq!(
            projection.apply(&paused),
            Applied::Updated {
                reload_media: false
            }
        );
        assert_eq!(projection.state().unwrap().status, PlayerStatus::Paused);

        let queued = ServerMessage::QueueUpdated {
            queue: vec![request()],
            state: state(PlayerStatus::Paused, Some(id), 8),
        };
        assert_eq!(
            projection.apply(&queued),
            Applied::Updated {
                reload_media: false
            },
            "a message with the whole queue can skip revisions"
        );
        assert_eq!(projection.queue().len(), 1);
    }

    #[test]
    fn mismatched_current_item_is_a_desync() {
        let mut projection = Projection::default();
        projection.apply(&snapshot(Some(request()), 4));

        let resumed = ServerMessage::PlayerResumed {
            state: state(PlayerStatus::Playing, Some(9999), 5),
        };

        assert_eq!(projection.apply(&resumed), Applied::DesyncDetected);
    }

    #[test]
    fn started_replaces_the_current_item() {
        let mut projection = Projection::default();
        projection.apply(&snapshot(None, 1));

        let next = request();
        let started = ServerMessage::PlayerStarted {
            state: state(PlayerStatus::Playing, Some(next.id.value()), 3),
            track: NowPlaying::Request(next.clone()),
            queue: vec![],
        };

        assert_eq!(
            projection.apply(&started),
            Applied::Updated { reload_media: true }
        );
        assert_eq!(projection.current_id(), Some(next.id.value()));

        let emptied = ServerMessage::QueueEmptied {
            state: state(PlayerStatus::Stopped, None, 4),
        };

        assert_eq!(
            projection.apply(&emptied),
            Applied::Updated { reload_media: true }
        );
        assert!(projection.current().is_none());
    }
}
