use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Id, Track};

pub type RequestId = Id<Request>;

/// A single song order, tracked through its payment and queue lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: RequestId,
    pub track: Track,
    /// The name shown next to the track, if the customer left one
    pub requester: Option<String>,
    pub dedication: Option<Dedication>,
    pub value_in_cents: u32,
    pub payment: PaymentStatus,
    pub status: QueueStatus,
    /// Priority requests are placed ahead of regular ones
    pub priority: bool,
    /// Moderation objected, and the request awaits an admin's decision
    pub flagged: bool,
    /// How playback of this request ended, once it was played
    pub ended_by: Option<EndReason>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dedication {
    pub text: String,
    pub author: Option<String>,
}

/// The data needed to create a [Request]
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub track: Track,
    pub requester: Option<String>,
    pub dedication: Option<Dedication>,
    pub value_in_cents: u32,
    pub priority: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueStatus {
    #[default]
    Pending,
    Queued,
    Playing,
    Played,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    /// A display reported the natural end of the video
    Completed,
    /// An admin skipped it
    Skipped,
    /// An admin stopped playback
    Stopped,
    /// A display could not play it
    Error,
    /// No display confirmed playback in time
    LoadTimeout,
}

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("Request {0} does not exist")]
    NotFound(RequestId),
    #[error("Payment of request {0} was cancelled")]
    PaymentCancelled(RequestId),
    #[error("Request {0} is not held for review")]
    NotFlagged(RequestId),
    #[error("Request {id} cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        id: RequestId,
        from: QueueStatus,
        to: QueueStatus,
    },
}

impl QueueStatus {
    /// Statuses only move forward, and nothing is cancelled once it played.
    pub fn can_become(self, next: QueueStatus) -> bool {
        use QueueStatus::*;

        matches!(
            (self, next),
            (Pending, Queued)
                | (Queued, Playing)
                | (Playing, Played)
                | (Pending, Cancelled)
                | (Queued, Cancelled)
        )
    }

    /// Whether the request is done with, one way or another
    pub fn is_finished(self) -> bool {
        matches!(self, QueueStatus::Played | QueueStatus::Cancelled)
    }
}

impl Request {
    pub fn new(new_request: NewRequest) -> Self {
        Self {
            id: RequestId::new(),
            track: new_request.track,
            requester: new_request.requester,
            dedication: new_request.dedication,
            value_in_cents: new_request.value_in_cents,
            payment: PaymentStatus::Pending,
            status: QueueStatus::Pending,
            priority: new_request.priority,
            flagged: false,
            ended_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment == PaymentStatus::Paid
    }

    pub(crate) fn transition(&mut self, next: QueueStatus) -> Result<(), RequestError> {
        if !self.status.can_become(next) {
            return Err(RequestError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
impl NewRequest {
    pub fn mock(video_id: &str) -> Self {
        Self {
            track: Track::mock(video_id),
            requester: Some("Mesa 4".to_string()),
            dedication: None,
            value_in_cents: 500,
            priority: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_only_move_forward() {
        let mut request = Request::new(NewRequest::mock("a"));

        request.transition(QueueStatus::Queued).unwrap();
        request.transition(QueueStatus::Playing).unwrap();

        assert!(request.transition(QueueStatus::Queued).is_err());
        assert!(
            request.transition(QueueStatus::Cancelled).is_err(),
            "a playing request can never be cancelled"
        );

        request.transition(QueueStatus::Played).unwrap();
        assert!(request.status.is_finished());
    }

    #[test]
    fn cancellation_is_allowed_before_playback() {
        assert!(QueueStatus::Pending.can_become(QueueStatus::Cancelled));
        assert!(QueueStatus::Queued.can_become(QueueStatus::Cancelled));
        assert!(!QueueStatus::Played.can_become(QueueStatus::Cancelled));
        assert!(!QueueStatus::Pending.can_become(QueueStatus::Playing));
    }
}
