//! Request bodies accepted by the endpoints, validated before they reach the jukebox

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;
use vitrola_core::{Dedication, NewRequest, Track};

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrackSchema {
    #[validate(length(min = 1, max = 64))]
    pub video_id: String,
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 512))]
    pub thumbnail: Option<String>,
    #[validate(range(min = 0.))]
    pub duration: Option<f32>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DedicationSchema {
    #[validate(length(min = 1, max = 280))]
    pub text: String,
    #[validate(length(max = 64))]
    pub author: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewRequestSchema {
    #[validate(nested)]
    pub track: TrackSchema,
    #[validate(length(max = 64))]
    pub requester: Option<String>,
    #[validate(nested)]
    pub dedication: Option<DedicationSchema>,
    #[serde(default)]
    pub value_in_cents: u32,
    #[serde(default)]
    pub priority: bool,
}

/// The outcome reported by the payment gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentEvent {
    Paid,
    Cancelled,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentSchema {
    pub status: PaymentEvent,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VolumeSchema {
    #[validate(range(max = 100))]
    pub volume: u8,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSchema {
    #[serde(rename = "chave")]
    #[validate(length(min = 1, max = 64))]
    pub key: String,
    #[serde(rename = "valor")]
    #[schema(value_type = Object)]
    pub value: Value,
}

impl From<TrackSchema> for Track {
    fn from(value: TrackSchema) -> Self {
        Self {
            video_id: value.video_id,
            title: value.title,
            thumbnail: value.thumbnail,
            duration: value.duration,
        }
    }
}

impl From<NewRequestSchema> for NewRequest {
    fn from(value: NewRequestSchema) -> Self {
        Self {
            track: value.track.into(),
            requester: value.requester.filter(|r| !r.trim().is_empty()),
            dedication: value.dedication.map(|d| Dedication {
                text: d.text,
                author: d.author,
            }),
            value_in_cents: value.value_in_cents,
            priority: value.priority,
        }
    }
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_bodies_are_validated() {
        let body: NewRequestSchema = serde_json::from_value(json!({
            "track": { "videoId": "dQw4w9WgXcQ", "title": "Never Gonna Give You Up" },
            "requester": "  ",
            "dedication": { "text": "" }
        }))
        .unwrap();

        assert!(body.validate().is_err(), "empty dedication is rejected");

        let body: NewRequestSchema = serde_json::from_value(json!({
            "track": { "videoId": "dQw4w9WgXcQ", "title": "Never Gonna Give You Up" },
            "requester": "  ",
            "valueInCents": 500
        }))
        .unwrap();

        assert!(body.validate().is_ok());

        let request: NewRequest = body.into();
        assert_eq!(request.requester, None);
        assert_eq!(request.value_in_cents, 500);
    }

    #[test]
    fn volume_is_bounded() {
        let body: VolumeSchema = serde_json::from_value(json!({ "volume": 101 })).unwrap();
        assert!(body.validate().is_err());
    }
}
