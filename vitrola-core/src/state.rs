use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Broadcaster, Config, Current, NowPlaying, PlaybackWatch, PlayerState, PlayerStateView,
    QueueStore, Recipients, ServerMessage, Snapshot,
};

/// Everything the jukebox owns. Only ever touched while holding the jukebox lock.
pub(crate) struct JukeboxState {
    pub config: Config,
    pub requests: QueueStore,
    pub player: PlayerState,
    /// Tracks whether a display confirmed the current item
    pub watch: Option<PlaybackWatch>,
    pub started_at: DateTime<Utc>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl JukeboxState {
    pub fn new(config: Config, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            player: PlayerState::new(config.default_volume),
            requests: Default::default(),
            watch: None,
            started_at: Utc::now(),
            config,
            broadcaster,
        }
    }

    /// Commits a transition: bumps the revision and broadcasts the message built from the new state.
    /// Every committed transition goes through here exactly once.
    pub fn commit<F>(&mut self, build: F)
    where
        F: FnOnce(&Self) -> ServerMessage,
    {
        self.player.revision += 1;

        let message = build(self);
        self.broadcaster.broadcast(message, Recipients::All);
    }

    /// Sends a message that carries no state
    pub fn notify(&self, message: ServerMessage, recipients: Recipients) {
        self.broadcaster.broadcast(message, recipients);
    }

    pub fn view(&self) -> PlayerStateView {
        PlayerStateView {
            status: self.player.status,
            current_id: self.player.current.as_ref().map(Current::id),
            ambient: matches!(self.player.current, Some(Current::Ambient(_))),
            volume: self.player.volume,
            revision: self.player.revision,
        }
    }

    pub fn now_playing(&self) -> Option<NowPlaying> {
        match self.player.current.as_ref()? {
            Current::Request(id) => self.requests.get(*id).cloned().map(NowPlaying::Request),
            Current::Ambient(ambient) => Some(NowPlaying::Ambient(ambient.clone())),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            queue: self.requests.queued(),
            current: self.now_playing(),
            state: self.view(),
            server_start_time: self.started_at,
            overlay: self.config.overlay.clone(),
        }
    }

    pub fn queue_updated(&self) -> ServerMessage {
        ServerMessage::QueueUpdated {
            queue: self.requests.queued(),
            state: self.view(),
        }
    }
}
