//! The messages exchanged with clients over the socket.
//!
//! Every message is an envelope of the form `{"evento": <name>, "dados": <payload>}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AmbientTrack, Dedication, IdType, OverlayConfig, PlayerStatus, Request, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    /// A TV rendering the player
    Display,
    /// The admin console
    Admin,
    /// The public queue page
    Customer,
}

/// What a client needs to know about the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateView {
    pub status: PlayerStatus,
    pub current_id: Option<IdType>,
    /// The current item is an ambient track rather than a request
    pub ambient: bool,
    pub volume: u8,
    pub revision: u64,
}

/// The item currently on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum NowPlaying {
    #[serde(rename = "pedido")]
    Request(Request),
    #[serde(rename = "ambiente")]
    Ambient(AmbientTrack),
}

/// Everything a client needs to rebuild its view from scratch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "fila")]
    pub queue: Vec<Request>,
    #[serde(rename = "musicaAtual")]
    pub current: Option<NowPlaying>,
    #[serde(rename = "estado")]
    pub state: PlayerStateView,
    #[serde(rename = "serverStartTime")]
    pub server_start_time: DateTime<Utc>,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "evento", content = "dados")]
pub enum ServerMessage {
    /// A new item started playing
    #[serde(rename = "player:iniciar")]
    PlayerStarted {
        #[serde(rename = "musica")]
        track: NowPlaying,
        #[serde(rename = "estado")]
        state: PlayerStateView,
        #[serde(rename = "fila")]
        queue: Vec<Request>,
    },
    #[serde(rename = "player:pausar")]
    PlayerPaused {
        #[serde(rename = "estado")]
        state: PlayerStateView,
    },
    #[serde(rename = "player:retomar")]
    PlayerResumed {
        #[serde(rename = "estado")]
        state: PlayerStateView,
    },
    /// An admin stopped playback, the queue is left as is
    #[serde(rename = "player:parar")]
    PlayerStopped {
        #[serde(rename = "estado")]
        state: PlayerStateView,
        #[serde(rename = "fila")]
        queue: Vec<Request>,
    },
    #[serde(rename = "player:volume")]
    VolumeChanged {
        #[serde(rename = "estado")]
        state: PlayerStateView,
    },
    #[serde(rename = "fila:atualizada")]
    QueueUpdated {
        #[serde(rename = "fila")]
        queue: Vec<Request>,
        #[serde(rename = "estado")]
        state: PlayerStateView,
    },
    /// The last item ended and nothing is left to play
    #[serde(rename = "fila:vazia")]
    QueueEmptied {
        #[serde(rename = "estado")]
        state: PlayerStateView,
    },
    /// Sent to a single client when it asks for it
    #[serde(rename = "estado:inicial")]
    InitialState(Snapshot),
    /// A display could not play an item, sent to admins
    #[serde(rename = "player:erro")]
    PlaybackFailed {
        #[serde(rename = "pedidoId")]
        id: IdType,
        #[serde(rename = "motivo")]
        reason: String,
    },
    /// Playback position reported by a display
    #[serde(rename = "player:tempo")]
    PlayerTime {
        #[serde(rename = "pedidoId")]
        id: IdType,
        #[serde(rename = "posicao")]
        position: f32,
        #[serde(rename = "duracao")]
        duration: Option<f32>,
    },
    #[serde(rename = "config:atualizada")]
    ConfigUpdated {
        #[serde(rename = "chave")]
        key: String,
        #[serde(rename = "valor")]
        value: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "evento", content = "dados")]
pub enum ClientMessage {
    /// Asks for a snapshot, with the last revision the client applied if any
    #[serde(rename = "request:estado-inicial")]
    RequestInitialState {
        #[serde(rename = "revisao", default)]
        revision: Option<u64>,
    },
    #[serde(rename = "musica:terminou")]
    TrackEnded {
        #[serde(rename = "pedidoId")]
        id: IdType,
    },
    #[serde(rename = "musica:erro")]
    PlaybackError {
        #[serde(rename = "pedidoId")]
        id: IdType,
        #[serde(rename = "mensagem")]
        message: String,
    },
    /// The display's player loaded the item and is playing it
    #[serde(rename = "musica:carregada")]
    TrackLoaded {
        #[serde(rename = "pedidoId")]
        id: IdType,
    },
    #[serde(rename = "player:posicao")]
    Position {
        #[serde(rename = "pedidoId")]
        id: IdType,
        #[serde(rename = "posicao")]
        position: f32,
        #[serde(rename = "duracao")]
        duration: Option<f32>,
    },
    /// The last revision the client applied
    #[serde(rename = "cliente:revisao")]
    Acknowledge {
        #[serde(rename = "revisao")]
        revision: u64,
    },
}

impl NowPlaying {
    pub fn id(&self) -> IdType {
        match self {
            NowPlaying::Request(request) => request.id.value(),
            NowPlaying::Ambient(ambient) => ambient.id.value(),
        }
    }

    pub fn track(&self) -> &Track {
        match self {
            NowPlaying::Request(request) => &request.track,
            NowPlaying::Ambient(ambient) => &ambient.track,
        }
    }

    pub fn dedication(&self) -> Option<&Dedication> {
        match self {
            NowPlaying::Request(request) => request.dedication.as_ref(),
            NowPlaying::Ambient(_) => None,
        }
    }
}

impl ServerMessage {
    /// Returns the player state carried by the message, if it is state-bearing
    pub fn state(&self) -> Option<&PlayerStateView> {
        match self {
            ServerMessage::PlayerStarted { state, .. }
            | ServerMessage::PlayerPaused { state }
            | ServerMessage::PlayerResumed { state }
            | ServerMessage::PlayerStopped { state, .. }
            | ServerMessage::VolumeChanged { state }
            | ServerMessage::QueueUpdated { state, .. }
            | ServerMessage::QueueEmptied { state } => Some(state),
            ServerMessage::InitialState(snapshot) => Some(&snapshot.state),
            ServerMessage::PlaybackFailed { .. }
            | ServerMessage::PlayerTime { .. }
            | ServerMessage::ConfigUpdated { .. } => None,
        }
    }

    /// The revision of a state-bearing message.
    /// Notifications carry none.
    pub fn revision(&self) -> Option<u64> {
        self.state().map(|s| s.revision)
    }

    /// Returns the full queue, if the message carries it
    pub fn queue(&self) -> Option<&[Request]> {
        match self {
            ServerMessage::PlayerStarted { queue, .. }
            | ServerMessage::PlayerStopped { queue, .. }
            | ServerMessage::QueueUpdated { queue, .. } => Some(queue.as_slice()),
            ServerMessage::InitialState(snapshot) => Some(snapshot.queue.as_slice()),
            ServerMessage::QueueEmptied { .. } => Some(&[][..]),
            _ => None,
        }
    }
}

impl ClientMessage {
    /// Whether only displays are allowed to send this message
    pub fn is_display_only(&self) -> bool {
        matches!(
            self,
            ClientMessage::TrackEnded { .. }
                | ClientMessage::PlaybackError { .. }
                | ClientMessage::TrackLoaded { .. }
                | ClientMessage::Position { .. }
        )
    }
}
