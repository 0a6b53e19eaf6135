use std::time::Instant;

use log::{debug, info};

use crate::{
    Applied, ClientMessage, IdType, OverlayFlags, OverlayInput, OverlayScheduler, PlayerBus,
    PlayerCommand, PlayerSignal, PlayerStatus, Projection, ServerMessage,
};

/// Drives a TV: applies server messages to its projection, controls its player,
/// and turns what the player reports into messages for the server.
pub struct Display<B> {
    bus: B,
    projection: Projection,
    overlays: OverlayScheduler,
    current_time: f32,
    duration: Option<f32>,
    /// The item this display already reported as ended
    ended: Option<IdType>,
}

impl<B> Display<B>
where
    B: PlayerBus,
{
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            projection: Projection::default(),
            overlays: OverlayScheduler::new(Default::default()),
            current_time: 0.,
            duration: None,
            ended: None,
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn overlays(&self) -> OverlayFlags {
        self.overlays.flags()
    }

    /// Returns the message to send right after the socket (re)connects.
    pub fn connect(&self) -> ClientMessage {
        ClientMessage::RequestInitialState {
            revision: self.projection.revision(),
        }
    }

    /// Applies a server message, returning a reply if one is needed.
    pub fn handle_message(&mut self, message: &ServerMessage) -> Option<ClientMessage> {
        match self.projection.apply(message) {
            Applied::DesyncDetected => {
                info!("Out of sync, requesting a snapshot");
                Some(self.connect())
            }
            Applied::StaleEvent => {
                debug!("Dropped stale {:?}", message.revision());
                None
            }
            Applied::Ignored => None,
            Applied::Updated { reload_media } => {
                if let ServerMessage::InitialState(snapshot) = message {
                    self.overlays.set_config(snapshot.overlay.clone());
                }

                if reload_media {
                    self.reload();
                }

                self.follow(message);
                None
            }
        }
    }

    /// Handles a signal from the player, returning the message to report it with.
    pub fn handle_signal(&mut self, signal: PlayerSignal, now: Instant) -> Option<ClientMessage> {
        let id = self.projection.current_id()?;

        match signal {
            PlayerSignal::Loaded => Some(ClientMessage::TrackLoaded { id }),
            PlayerSignal::Position {
                current_time,
                duration,
            } => {
                self.current_time = current_time;
                self.duration = duration;
                self.tick(now);

                Some(ClientMessage::Position {
                    id,
                    position: current_time,
                    duration,
                })
            }
            PlayerSignal::Ended => {
                // Players may fire the end event more than once
                if self.ended == Some(id) {
                    return None;
                }

                self.ended = Some(id);
                Some(ClientMessage::TrackEnded { id })
            }
            PlayerSignal::Error(message) => Some(ClientMessage::PlaybackError { id, message }),
        }
    }

    /// Re-derives the overlays from the last known telemetry.
    pub fn tick(&mut self, now: Instant) -> OverlayFlags {
        let current = self.projection.current();

        let input = OverlayInput {
            current_time: self.current_time,
            duration: self
                .duration
                .or_else(|| current.and_then(|c| c.track().duration)),
            queue_length: self.projection.queue().len(),
            has_current: current.is_some(),
            has_dedication: current.is_some_and(|c| c.dedication().is_some()),
        };

        self.overlays.tick(now, &input)
    }

    fn reload(&mut self) {
        self.current_time = 0.;
        self.duration = None;
        self.overlays.reset();

        match self.projection.current() {
            Some(current) => {
                let track = current.track();

                self.bus.send(PlayerCommand::Load {
                    video_id: track.video_id.clone(),
                    title: track.title.clone(),
                });
            }
            None => self.bus.send(PlayerCommand::Stop),
        }
    }

    /// Matches the player to the state carried by the message
    fn follow(&self, message: &ServerMessage) {
        match message {
            ServerMessage::PlayerPaused { .. } => self.bus.send(PlayerCommand::Pause),
            ServerMessage::PlayerResumed { .. } => self.bus.send(PlayerCommand::Play),
            ServerMessage::VolumeChanged { state } => {
                self.bus.send(PlayerCommand::SetVolume(state.volume))
            }
            ServerMessage::InitialState(snapshot) => {
                self.bus
                    .send(PlayerCommand::SetVolume(snapshot.state.volume));

                // The snapshot is the whole truth, even if the player missed a pause or resume
                self.bus.send(match snapshot.state.status {
                    PlayerStatus::Playing => PlayerCommand::Play,
                    PlayerStatus::Paused => PlayerCommand::Pause,
                    PlayerStatus::Stopped => PlayerCommand::Stop,
                });
            }
            _ => {}
        }
    }
}
