use serde::{Deserialize, Serialize};

use crate::Id;

pub type AmbientId = Id<AmbientTrack>;

/// A reference to an external video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// The id of the video on the external platform
    pub video_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    /// The length of the video in seconds, if known
    pub duration: Option<f32>,
}

/// A track injected by an admin to fill silence.
/// It never occupies a queue slot and is never stored as a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbientTrack {
    pub id: AmbientId,
    pub track: Track,
}

impl AmbientTrack {
    pub fn new(track: Track) -> Self {
        Self {
            id: AmbientId::new(),
            track,
        }
    }
}

#[cfg(test)]
impl Track {
    pub fn mock(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: format!("Title of {}", video_id),
            thumbnail: None,
            duration: Some(180.),
        }
    }
}
