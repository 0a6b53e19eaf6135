use crossbeam::channel::Sender;

/// Commands sent to the embedded video player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Loads a video and starts playing it
    Load { video_id: String, title: String },
    Play,
    Pause,
    Stop,
    SetVolume(u8),
}

/// Signals reported back by the embedded video player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerSignal {
    /// The video loaded and started playing
    Loaded,
    Position {
        /// The position in seconds
        current_time: f32,
        duration: Option<f32>,
    },
    Ended,
    Error(String),
}

/// The link between a display and the player it controls
pub trait PlayerBus {
    fn send(&self, command: PlayerCommand);
}

impl PlayerBus for Sender<PlayerCommand> {
    fn send(&self, command: PlayerCommand) {
        let _ = Sender::send(self, command);
    }
}
