//! Admission decides whether a pending request may enter the queue.

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    state::JukeboxState, Current, EndReason, ModerationAction, ModerationVerdict, PlayerStatus,
    QueueStatus, RequestError, RequestId,
};

/// Why a request was kept out of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    PaymentNotConfirmed,
    DuplicateTrack,
    ModerationBlocked,
    QueueFull,
}

#[derive(Debug, Error, PartialEq)]
pub enum AdmissionError {
    #[error("Request was rejected: {0:?}")]
    Rejected(RejectionReason),
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// A request that made it into the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub id: RequestId,
    /// The position in the queue, or `None` if it started playing right away
    pub position: Option<usize>,
}

/// What happened to a freshly submitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The request waits for its payment to be confirmed
    AwaitingPayment,
    Admitted(Admission),
    Rejected(RejectionReason),
}

impl AdmissionError {
    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            AdmissionError::Rejected(reason) => Some(*reason),
            AdmissionError::Request(_) => None,
        }
    }
}

impl JukeboxState {
    /// Runs the admission checks on a pending request and queues it.
    ///
    /// Checks happen in order: payment, duplicates, moderation, capacity.
    /// A rejected request stays pending and nothing is broadcast.
    pub fn admit(
        &mut self,
        id: RequestId,
        verdict: ModerationVerdict,
    ) -> Result<Admission, AdmissionError> {
        let config = &self.config;
        let request = self.requests.get(id).ok_or(RequestError::NotFound(id))?;

        if request.status != QueueStatus::Pending {
            return Err(RequestError::InvalidTransition {
                id,
                from: request.status,
                to: QueueStatus::Queued,
            }
            .into());
        }

        if !request.is_paid() && !config.free_mode {
            return Err(AdmissionError::Rejected(
                RejectionReason::PaymentNotConfirmed,
            ));
        }

        if config.prevent_duplicates && self.requests.is_in_rotation(&request.track.video_id) {
            return Err(AdmissionError::Rejected(RejectionReason::DuplicateTrack));
        }

        if let ModerationVerdict::Blocked(category) = verdict {
            info!("Moderation blocked the {:?} of {}", category, id);

            if config.moderation.action == ModerationAction::FlagForReview {
                self.requests.get_mut(id)?.flagged = true;
            }

            return Err(AdmissionError::Rejected(RejectionReason::ModerationBlocked));
        }

        if config
            .max_queue_size
            .is_some_and(|max| self.requests.len() >= max)
        {
            return Err(AdmissionError::Rejected(RejectionReason::QueueFull));
        }

        let position = self.requests.enqueue(id)?;
        self.requests.get_mut(id)?.flagged = false;

        info!("Admitted {} at position {}", id, position);

        let started = self.start_if_idle();

        Ok(Admission {
            id,
            position: (!started).then_some(position),
        })
    }

    /// Starts the freshly queued head if nothing else should be on screen,
    /// otherwise broadcasts the new queue.
    fn start_if_idle(&mut self) -> bool {
        let idle = self.player.status == PlayerStatus::Stopped && self.requests.len() == 1;
        let ambient = matches!(self.player.current, Some(Current::Ambient(_)));

        if idle || ambient {
            if ambient {
                info!("Request preempts the ambient track");
                self.finish_current(EndReason::Skipped);
            }

            if self.start_next() {
                self.commit(Self::started);
                return true;
            }
        }

        self.commit(Self::queue_updated);
        false
    }

    /// Cancels requests that waited too long for a payment or a review,
    /// or that go beyond the configured number of waiting requests.
    pub fn expire_pending(&mut self) {
        let cutoff = self.config.pending_cutoff(Utc::now());
        let expired = self
            .requests
            .expire_pending(cutoff, self.config.max_pending);

        if !expired.is_empty() {
            info!("Dropped {} requests that were never admitted", expired.len());
        }
    }

    /// Cancels a request that has not played yet
    pub fn cancel(&mut self, id: RequestId) -> Result<(), RequestError> {
        if self.requests.cancel(id)? {
            self.commit(Self::queue_updated);
        }

        info!("Cancelled {}", id);
        Ok(())
    }
}
