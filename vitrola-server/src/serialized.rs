//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use vitrola_core::{
    Admission, Config, EndReason, PaymentStatus, PlayerStateView, PlayerStatus, QueueStatus,
    RejectionReason, Request,
};

/// A request as shown on the public queue
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    id: u64,
    video_id: String,
    title: String,
    thumbnail: Option<String>,
    duration: Option<f32>,
    requester: Option<String>,
    dedication: Option<String>,
    priority: bool,
}

/// Everything known about a request
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    #[serde(flatten)]
    item: QueueItem,
    #[schema(value_type = String)]
    status: QueueStatus,
    #[schema(value_type = String)]
    payment: PaymentStatus,
    value_in_cents: u32,
    flagged: bool,
    #[schema(value_type = Option<String>)]
    ended_by: Option<EndReason>,
    /// The position in the queue, while queued
    position: Option<usize>,
    created_at: String,
}

/// The outcome of an admission attempt
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResult {
    accepted: bool,
    /// Why the request was not accepted, if it was not
    #[schema(value_type = Option<String>)]
    reason: Option<RejectionReason>,
    /// Set when the request still waits for its payment
    awaiting_payment: bool,
    request: RequestDetails,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[schema(value_type = String)]
    status: PlayerStatus,
    current_id: Option<u64>,
    ambient: bool,
    volume: u8,
    revision: u64,
}

/// The settings that can be changed at runtime
#[derive(Debug, Serialize, ToSchema)]
pub struct Settings {
    #[serde(rename = "modoGratuito")]
    free_mode: bool,
    #[serde(rename = "bloquearDuplicadas")]
    prevent_duplicates: bool,
    #[serde(rename = "limiteFila")]
    max_queue_size: Option<usize>,
    #[serde(rename = "tempoCarregamento")]
    load_timeout_in_seconds: Option<f32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigEntry {
    #[serde(rename = "chave")]
    pub key: String,
    #[serde(rename = "valor")]
    #[schema(value_type = Object)]
    pub value: Value,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<QueueItem> for Request {
    fn to_serialized(&self) -> QueueItem {
        QueueItem {
            id: self.id.value(),
            video_id: self.track.video_id.clone(),
            title: self.track.title.clone(),
            thumbnail: self.track.thumbnail.clone(),
            duration: self.track.duration,
            requester: self.requester.clone(),
            dedication: self.dedication.as_ref().map(|d| d.text.clone()),
            priority: self.priority,
        }
    }
}

impl ToSerialized<PlayerState> for PlayerStateView {
    fn to_serialized(&self) -> PlayerState {
        PlayerState {
            status: self.status,
            current_id: self.current_id,
            ambient: self.ambient,
            volume: self.volume,
            revision: self.revision,
        }
    }
}

impl ToSerialized<Settings> for Config {
    fn to_serialized(&self) -> Settings {
        Settings {
            free_mode: self.free_mode,
            prevent_duplicates: self.prevent_duplicates,
            max_queue_size: self.max_queue_size,
            load_timeout_in_seconds: self.load_timeout_in_seconds,
        }
    }
}

impl RequestDetails {
    pub fn new(request: &Request, position: Option<usize>) -> Self {
        Self {
            item: request.to_serialized(),
            status: request.status,
            payment: request.payment,
            value_in_cents: request.value_in_cents,
            flagged: request.flagged,
            ended_by: request.ended_by,
            position,
            created_at: request.created_at.to_rfc3339(),
        }
    }
}

impl AdmissionResult {
    pub fn accepted(admission: Admission, request: &Request) -> Self {
        Self {
            accepted: true,
            reason: None,
            awaiting_payment: false,
            request: RequestDetails::new(request, admission.position),
        }
    }

    pub fn rejected(reason: RejectionReason, request: &Request) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            awaiting_payment: false,
            request: RequestDetails::new(request, None),
        }
    }

    pub fn awaiting_payment(request: &Request) -> Self {
        Self {
            accepted: false,
            reason: None,
            awaiting_payment: true,
            request: RequestDetails::new(request, None),
        }
    }

    /// The payment was cancelled, and the request will never play
    pub fn cancelled(request: &Request) -> Self {
        Self {
            accepted: false,
            reason: None,
            awaiting_payment: false,
            request: RequestDetails::new(request, None),
        }
    }
}
