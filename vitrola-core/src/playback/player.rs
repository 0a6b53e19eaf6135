use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    state::JukeboxState, AmbientId, AmbientTrack, ClientRole, EndReason, IdType, Recipients,
    RequestId, ServerMessage, Track,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// Nothing is playing. This is where the player starts, and where it ends up once the queue runs dry.
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// What is on screen
#[derive(Debug, Clone, PartialEq)]
pub enum Current {
    Request(RequestId),
    /// Ambient tracks are never part of the queue
    Ambient(AmbientTrack),
}

/// The single source of truth for what the displays should be playing
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub status: PlayerStatus,
    pub current: Option<Current>,
    pub volume: u8,
    /// Incremented on every committed transition
    pub revision: u64,
}

/// Tracks whether any display confirmed it is playing the current item
#[derive(Debug, Clone, Copy)]
pub struct PlaybackWatch {
    pub id: IdType,
    pub started_at: Instant,
    pub confirmed: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("The player is already playing")]
    AlreadyPlaying,
    #[error("The player is not playing")]
    NotPlaying,
    #[error("The player is not paused")]
    NotPaused,
    #[error("Nothing is playing")]
    NothingPlaying,
    #[error("The queue is empty")]
    QueueEmpty,
    #[error("Ambient tracks can only play while the queue is empty")]
    QueueNotEmpty,
    #[error("A customer's request is playing")]
    CustomerTrackPlaying,
    #[error("Volume must be between 0 and 100, got {0}")]
    InvalidVolume(u8),
}

impl Current {
    pub fn id(&self) -> IdType {
        match self {
            Current::Request(id) => id.value(),
            Current::Ambient(ambient) => ambient.id.value(),
        }
    }
}

impl PlayerState {
    pub fn new(volume: u8) -> Self {
        Self {
            status: PlayerStatus::Stopped,
            current: None,
            volume: volume.min(100),
            revision: 0,
        }
    }

    pub fn current_id(&self) -> Option<IdType> {
        self.current.as_ref().map(Current::id)
    }

    /// Whether the given id is the item on screen
    pub fn is_current(&self, id: IdType) -> bool {
        self.current_id() == Some(id)
    }
}

impl PlaybackWatch {
    pub fn new(id: IdType) -> Self {
        Self {
            id,
            started_at: Instant::now(),
            confirmed: false,
        }
    }
}

impl JukeboxState {
    /// Starts playing from the head of the queue.
    /// While paused, this resumes instead.
    pub fn play(&mut self) -> Result<(), PlayerError> {
        match self.player.status {
            PlayerStatus::Playing => Err(PlayerError::AlreadyPlaying),
            PlayerStatus::Paused => self.resume(),
            PlayerStatus::Stopped => {
                if !self.start_next() {
                    return Err(PlayerError::QueueEmpty);
                }

                self.commit(Self::started);
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        if self.player.status != PlayerStatus::Playing {
            return Err(PlayerError::NotPlaying);
        }

        self.player.status = PlayerStatus::Paused;
        self.commit(|s| ServerMessage::PlayerPaused { state: s.view() });

        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlayerError> {
        if self.player.status != PlayerStatus::Paused {
            return Err(PlayerError::NotPaused);
        }

        // Pausing stops the clock on loading
        if let Some(watch) = self.watch.as_mut().filter(|w| !w.confirmed) {
            watch.started_at = Instant::now();
        }

        self.player.status = PlayerStatus::Playing;
        self.commit(|s| ServerMessage::PlayerResumed { state: s.view() });

        Ok(())
    }

    /// Halts playback without advancing the queue.
    /// The current request is done with, and `play` continues from the head.
    pub fn stop(&mut self) -> Result<(), PlayerError> {
        if self.player.current.is_none() {
            return Err(PlayerError::NothingPlaying);
        }

        self.finish_current(EndReason::Stopped);
        self.player.status = PlayerStatus::Stopped;

        self.commit(|s| ServerMessage::PlayerStopped {
            state: s.view(),
            queue: s.requests.queued(),
        });

        Ok(())
    }

    pub fn skip(&mut self) -> Result<(), PlayerError> {
        if self.player.current.is_none() {
            return Err(PlayerError::NothingPlaying);
        }

        self.advance(EndReason::Skipped);
        Ok(())
    }

    /// Handles a display reporting that an item ended.
    /// Only the first report for the current item counts, everything else is dropped.
    pub fn track_ended(&mut self, id: IdType) -> bool {
        if !self.player.is_current(id) {
            debug!("Ignored end of {}, which is not current", id);
            return false;
        }

        info!("Item {} ended", id);
        self.advance(EndReason::Completed);

        true
    }

    /// Handles a display failing to play an item, which skips it.
    pub fn playback_error(&mut self, id: IdType, message: String) -> bool {
        if !self.player.is_current(id) {
            debug!("Ignored error of {}, which is not current", id);
            return false;
        }

        warn!("Display failed to play {}: {}", id, message);
        self.advance(EndReason::Error);
        self.notify_failure(id, message);

        true
    }

    /// Plays an ambient track right away.
    /// Only allowed when no customer is waiting for their request.
    pub fn direct_play(&mut self, track: Track) -> Result<AmbientId, PlayerError> {
        if matches!(self.player.current, Some(Current::Request(_))) {
            return Err(PlayerError::CustomerTrackPlaying);
        }

        if !self.requests.is_empty() {
            return Err(PlayerError::QueueNotEmpty);
        }

        let ambient = AmbientTrack::new(track);
        let id = ambient.id;

        self.set_current(Current::Ambient(ambient));
        self.commit(Self::started);

        Ok(id)
    }

    pub fn set_volume(&mut self, volume: u8) -> Result<(), PlayerError> {
        if volume > 100 {
            return Err(PlayerError::InvalidVolume(volume));
        }

        self.player.volume = volume;
        self.commit(|s| ServerMessage::VolumeChanged { state: s.view() });

        Ok(())
    }

    /// Marks the current item as confirmed by a display.
    pub fn confirm(&mut self, id: IdType) -> bool {
        match self.watch.as_mut() {
            Some(watch) if watch.id == id => {
                if !watch.confirmed {
                    debug!("Display confirmed {}", id);
                }

                watch.confirmed = true;
                true
            }
            _ => false,
        }
    }

    /// Relays a display's playback position to everyone but the displays.
    pub fn report_position(&mut self, id: IdType, position: f32, duration: Option<f32>) -> bool {
        if !self.confirm(id) {
            return false;
        }

        self.notify(
            ServerMessage::PlayerTime {
                id,
                position,
                duration,
            },
            Recipients::Except(ClientRole::Display),
        );

        true
    }

    /// Skips the current item if no display confirmed it in time.
    pub fn check_load_timeout(&mut self, now: Instant) -> bool {
        let Some(timeout) = self.config.load_timeout() else {
            return false;
        };

        let Some(watch) = self.watch else {
            return false;
        };

        let expired = self.player.status == PlayerStatus::Playing
            && !watch.confirmed
            && now.saturating_duration_since(watch.started_at) >= timeout;

        if !expired {
            return false;
        }

        warn!("No display loaded {} within {:?}, skipping", watch.id, timeout);
        self.advance(EndReason::LoadTimeout);
        self.notify_failure(watch.id, "timeout".to_string());

        true
    }

    /// Takes the head of the queue and makes it current, without committing.
    pub(crate) fn start_next(&mut self) -> bool {
        let Some(id) = self.requests.start_next() else {
            return false;
        };

        self.set_current(Current::Request(id));
        true
    }

    /// Finishes the current item and moves on to the next one, or stops.
    pub(crate) fn advance(&mut self, reason: EndReason) {
        self.finish_current(reason);

        if self.start_next() {
            self.commit(Self::started);
        } else {
            self.player.status = PlayerStatus::Stopped;
            self.commit(|s| ServerMessage::QueueEmptied { state: s.view() });
        }
    }

    pub(crate) fn finish_current(&mut self, reason: EndReason) {
        self.watch = None;

        if let Some(Current::Request(id)) = self.player.current.take() {
            if let Err(error) = self.requests.finish(id, reason) {
                warn!("Could not finish {}: {}", id, error);
            }
        }
    }

    pub(crate) fn started(&self) -> ServerMessage {
        match self.now_playing() {
            Some(track) => ServerMessage::PlayerStarted {
                track,
                state: self.view(),
                queue: self.requests.queued(),
            },
            None => ServerMessage::QueueEmptied { state: self.view() },
        }
    }

    fn set_current(&mut self, current: Current) {
        self.watch = Some(PlaybackWatch::new(current.id()));
        self.player.current = Some(current);
        self.player.status = PlayerStatus::Playing;
    }

    fn notify_failure(&self, id: IdType, reason: String) {
        self.notify(
            ServerMessage::PlaybackFailed { id, reason },
            Recipients::Only(ClientRole::Admin),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use crossbeam::channel::{unbounded, Receiver};

    use super::*;
    use crate::{Config, NewRequest, QueueStatus, Request};

    type Messages = Receiver<(ServerMessage, Recipients)>;

    fn state() -> (JukeboxState, Messages) {
        let (sender, receiver) = unbounded();
        (JukeboxState::new(Config::default(), Arc::new(sender)), receiver)
    }

    fn queue(state: &mut JukeboxState, video_id: &str) -> RequestId {
        let id = state.requests.insert(Request::new(NewRequest::mock(video_id)));
        state.requests.enqueue(id).unwrap();
        id
    }

    #[test]
    fn pausing_and_resuming() {
        let (mut state, messages) = state();

        assert_eq!(state.pause(), Err(PlayerError::NotPlaying));
        assert_eq!(state.play(), Err(PlayerError::QueueEmpty));

        queue(&mut state, "a");
        state.play().unwrap();
        state.pause().unwrap();
        assert_eq!(state.pause(), Err(PlayerError::NotPlaying));
        state.play().unwrap();

        let events: Vec<_> = messages.try_iter().map(|(m, _)| m).collect();

        assert!(matches!(events[0], ServerMessage::PlayerStarted { .. }));
        assert!(matches!(events[1], ServerMessage::PlayerPaused { .. }));
        assert!(matches!(events[2], ServerMessage::PlayerResumed { .. }));
        assert_eq!(state.player.revision, 3);
    }

    #[test]
    fn stopping_does_not_advance() {
        let (mut state, messages) = state();

        let first = queue(&mut state, "a");
        let second = queue(&mut state, "b");

        state.play().unwrap();
        state.stop().unwrap();

        assert_eq!(state.player.status, PlayerStatus::Stopped);
        assert_eq!(
            state.requests.get(first).unwrap().ended_by,
            Some(EndReason::Stopped)
        );
        assert_eq!(
            state.requests.get(second).unwrap().status,
            QueueStatus::Queued
        );

        let (last, _) = messages.try_iter().last().unwrap();
        assert!(matches!(last, ServerMessage::PlayerStopped { ref queue, .. } if queue.len() == 1));

        state.play().unwrap();
        assert!(state.player.is_current(second.value()));
    }

    #[test]
    fn unconfirmed_items_time_out() {
        let (mut state, messages) = state();

        let first = queue(&mut state, "a");
        queue(&mut state, "b");
        state.play().unwrap();

        let started = state.watch.unwrap().started_at;
        assert!(!state.check_load_timeout(started + Duration::from_secs(5)));
        assert!(state.check_load_timeout(started + Duration::from_secs(31)));

        assert_eq!(
            state.requests.get(first).unwrap().ended_by,
            Some(EndReason::LoadTimeout)
        );

        let events: Vec<_> = messages.try_iter().collect();
        let (failure, recipients) = events.last().unwrap();

        assert_eq!(*recipients, Recipients::Only(ClientRole::Admin));
        assert!(matches!(failure, ServerMessage::PlaybackFailed { id, .. } if *id == first.value()));
    }

    #[test]
    fn confirmed_items_do_not_time_out() {
        let (mut state, messages) = state();

        let id = queue(&mut state, "a");
        state.play().unwrap();

        assert!(state.report_position(id.value(), 1.5, Some(180.)));

        let started = state.watch.unwrap().started_at;
        assert!(!state.check_load_timeout(started + Duration::from_secs(60)));

        let (time, recipients) = messages.try_iter().last().unwrap();
        assert_eq!(recipients, Recipients::Except(ClientRole::Display));
        assert_eq!(time.revision(), None);
    }

    #[test]
    fn paused_items_do_not_time_out() {
        let (mut state, _messages) = state();

        queue(&mut state, "a");
        state.play().unwrap();
        state.pause().unwrap();

        let started = state.watch.unwrap().started_at;
        assert!(!state.check_load_timeout(started + Duration::from_secs(60)));
    }

    #[test]
    fn volume_is_bounded() {
        let (mut state, _messages) = state();

        assert_eq!(state.set_volume(101), Err(PlayerError::InvalidVolume(101)));
        assert_eq!(state.player.revision, 0);

        state.set_volume(35).unwrap();
        assert_eq!(state.view().volume, 35);
        assert_eq!(state.player.revision, 1);
    }
}
