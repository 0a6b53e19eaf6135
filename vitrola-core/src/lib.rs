use std::{sync::Arc, time::Instant};

use log::info;
use parking_lot::Mutex;
use serde_json::Value;
use state::JukeboxState;

mod admission;
mod client;
mod config;
mod events;
mod moderation;
mod playback;
mod protocol;
mod queue;
mod state;
mod sync;
mod track;
mod util;

pub mod implementors;
pub use admission::*;
pub use client::*;
pub use config::*;
pub use events::*;
pub use moderation::*;
pub use playback::*;
pub use protocol::*;
pub use queue::*;
pub use sync::*;
pub use track::*;
pub use util::*;

/// The jukebox, owning the queue and the player.
///
/// Every operation that changes state runs under a single lock,
/// and broadcasts its outcome before releasing it. That way every client
/// sees the same revisions in the same order.
pub struct Jukebox {
    pub(crate) state: Mutex<JukeboxState>,
    moderation: Arc<dyn Moderation>,
}

/// A request as it was submitted, and what happened to it
#[derive(Debug, Clone)]
pub struct Submission {
    pub request: Request,
    pub outcome: SubmissionOutcome,
}

impl Jukebox {
    /// Creates the jukebox, and spawns its watchdog.
    pub fn new(
        config: Config,
        broadcaster: Arc<dyn Broadcaster>,
        moderation: Arc<dyn Moderation>,
    ) -> Arc<Self> {
        let jukebox = Arc::new(Self {
            state: Mutex::new(JukeboxState::new(config, broadcaster)),
            moderation,
        });

        spawn_watchdog_thread(&jukebox);
        jukebox
    }

    /// Registers a new request.
    /// In free mode it goes through admission right away, otherwise it waits for its payment.
    pub async fn submit(&self, new_request: NewRequest) -> Result<Submission, RequestError> {
        let (id, free_mode) = {
            let mut state = self.state.lock();
            let id = state.requests.insert(Request::new(new_request));
            state.expire_pending();

            (id, state.config.free_mode)
        };

        info!("Request {} submitted", id);

        let outcome = if free_mode {
            match self.admit(id).await {
                Ok(admission) => SubmissionOutcome::Admitted(admission),
                Err(AdmissionError::Rejected(reason)) => SubmissionOutcome::Rejected(reason),
                Err(AdmissionError::Request(error)) => return Err(error),
            }
        } else {
            SubmissionOutcome::AwaitingPayment
        };

        let request = self.request(id).ok_or(RequestError::NotFound(id))?;
        Ok(Submission { request, outcome })
    }

    /// Runs admission on a pending request.
    pub async fn admit(&self, id: RequestId) -> Result<Admission, AdmissionError> {
        let (request, config) = {
            let state = self.state.lock();
            let request = state.requests.get(id).ok_or(RequestError::NotFound(id))?;

            (request.clone(), state.config.moderation.clone())
        };

        // Moderation may go over the network, so it runs outside the lock
        let verdict = moderate(self.moderation.as_ref(), &config, &request).await;

        self.state.lock().admit(id, verdict)
    }

    /// Lets a request held by moderation into the queue.
    /// Requests moderation rejected outright cannot be approved.
    pub fn approve(&self, id: RequestId) -> Result<Admission, AdmissionError> {
        let mut state = self.state.lock();
        let request = state.requests.get(id).ok_or(RequestError::NotFound(id))?;

        if !request.flagged {
            return Err(RequestError::NotFlagged(id).into());
        }

        state.admit(id, ModerationVerdict::Allowed)
    }

    /// Marks a request as paid and runs admission on it.
    pub async fn confirm_payment(&self, id: RequestId) -> Result<Admission, AdmissionError> {
        {
            let mut state = self.state.lock();
            let request = state.requests.get_mut(id)?;

            if request.payment == PaymentStatus::Cancelled {
                return Err(RequestError::PaymentCancelled(id).into());
            }

            request.payment = PaymentStatus::Paid;
        }

        info!("Payment of {} confirmed", id);
        self.admit(id).await
    }

    /// Marks a payment as cancelled, removing its request if it did not play yet.
    pub fn cancel_payment(&self, id: RequestId) -> Result<(), RequestError> {
        let mut state = self.state.lock();
        let request = state.requests.get_mut(id)?;

        request.payment = PaymentStatus::Cancelled;

        if request.status.is_finished() || request.status == QueueStatus::Playing {
            return Ok(());
        }

        state.cancel(id)
    }

    /// Removes a request that did not play yet.
    pub fn cancel_request(&self, id: RequestId) -> Result<(), RequestError> {
        self.state.lock().cancel(id)
    }

    pub fn play(&self) -> Result<(), PlayerError> {
        self.state.lock().play()
    }

    pub fn pause(&self) -> Result<(), PlayerError> {
        self.state.lock().pause()
    }

    pub fn resume(&self) -> Result<(), PlayerError> {
        self.state.lock().resume()
    }

    pub fn stop(&self) -> Result<(), PlayerError> {
        self.state.lock().stop()
    }

    pub fn skip(&self) -> Result<(), PlayerError> {
        self.state.lock().skip()
    }

    pub fn set_volume(&self, volume: u8) -> Result<(), PlayerError> {
        self.state.lock().set_volume(volume)
    }

    /// Plays an ambient track, while nobody's request is waiting.
    pub fn direct_play(&self, track: Track) -> Result<AmbientId, PlayerError> {
        self.state.lock().direct_play(track)
    }

    /// A display reports the natural end of an item. Returns false if it was ignored.
    pub fn track_ended(&self, id: IdType) -> bool {
        self.state.lock().track_ended(id)
    }

    /// A display reports it could not play an item. Returns false if it was ignored.
    pub fn playback_error(&self, id: IdType, message: String) -> bool {
        self.state.lock().playback_error(id, message)
    }

    /// A display reports it loaded the current item.
    pub fn confirm_playback(&self, id: IdType) -> bool {
        self.state.lock().confirm(id)
    }

    pub fn report_position(&self, id: IdType, position: f32, duration: Option<f32>) -> bool {
        self.state.lock().report_position(id, position, duration)
    }

    pub fn check_load_timeout(&self, now: Instant) -> bool {
        self.state.lock().check_load_timeout(now)
    }

    /// Drops requests that waited too long, then forgets old finished requests.
    /// Returns how many were forgotten.
    pub fn prune_history(&self) -> usize {
        let mut state = self.state.lock();
        state.expire_pending();

        let keep = state.config.history_size;
        state.requests.prune(keep)
    }

    /// Applies a runtime setting, and lets every client know about it.
    /// Keys the jukebox does not know are passed along as is.
    pub fn update_config(&self, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut state = self.state.lock();

        if !state.config.apply(key, &value)? {
            info!("Passing through unknown setting {}", key);
        }

        state.notify(
            ServerMessage::ConfigUpdated {
                key: key.to_string(),
                value,
            },
            Recipients::All,
        );

        Ok(())
    }

    pub fn queue(&self) -> Vec<Request> {
        self.state.lock().requests.queued()
    }

    pub fn request(&self, id: RequestId) -> Option<Request> {
        self.state.lock().requests.get(id).cloned()
    }

    /// Returns the position of a queued request
    pub fn position(&self, id: RequestId) -> Option<usize> {
        self.state.lock().requests.position(id)
    }

    pub fn player_state(&self) -> PlayerStateView {
        self.state.lock().view()
    }

    pub fn now_playing(&self) -> Option<NowPlaying> {
        self.state.lock().now_playing()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.state.lock().player.revision
    }

    pub fn config(&self) -> Config {
        self.state.lock().config.clone()
    }
}
