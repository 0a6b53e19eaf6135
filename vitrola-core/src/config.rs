use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::{ModerationCategory, OverlayConfig};

/// The configuration of the jukebox
#[derive(Debug, Clone)]
pub struct Config {
    /// Requests can be queued without a confirmed payment
    pub free_mode: bool,
    /// Reject requests for a track that is already queued or playing
    pub prevent_duplicates: bool,
    /// How many requests can wait in the queue, if limited
    pub max_queue_size: Option<usize>,
    pub moderation: ModerationConfig,
    /// How long a display may take to confirm it is playing the current item
    pub load_timeout_in_seconds: Option<f32>,
    /// How many revisions a client may lag behind before it is sent a snapshot
    pub desync_threshold: u64,
    pub default_volume: u8,
    /// How many finished requests are kept around for lookups
    pub history_size: usize,
    /// How long a request may wait for its payment or a review before it is dropped, 0 to keep them
    pub pending_ttl_in_seconds: u64,
    /// How many requests may wait for a payment or a review at once
    pub max_pending: usize,
    /// Timings shipped to displays in every snapshot
    pub overlay: OverlayConfig,
}

/// What moderation looks at, and what happens when it objects
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub check_requester_name: bool,
    pub check_track_title: bool,
    pub check_dedication: bool,
    pub action: ModerationAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    /// The request is rejected outright
    Reject,
    /// The request is rejected, but held for an admin to approve
    FlagForReview,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: Value },
}

impl Config {
    pub const FREE_MODE_KEY: &'static str = "modoGratuito";
    pub const PREVENT_DUPLICATES_KEY: &'static str = "bloquearDuplicadas";
    pub const MAX_QUEUE_SIZE_KEY: &'static str = "limiteFila";
    pub const LOAD_TIMEOUT_KEY: &'static str = "tempoCarregamento";

    /// The longest load timeout accepted, an hour
    pub const MAX_LOAD_TIMEOUT_IN_SECONDS: f64 = 3600.;

    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_in_seconds
            .filter(|s| *s > 0.)
            .and_then(|s| Duration::try_from_secs_f32(s).ok())
    }

    /// Requests created before the returned instant waited too long
    pub fn pending_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Some(self.pending_ttl_in_seconds)
            .filter(|ttl| *ttl > 0)
            .and_then(|ttl| i64::try_from(ttl).ok())
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| now.checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Returns the timeout as stored, or `None` if it is negative, not finite or too long.
    pub fn valid_load_timeout(seconds: f64) -> Option<f32> {
        (seconds.is_finite() && (0. ..=Self::MAX_LOAD_TIMEOUT_IN_SECONDS).contains(&seconds))
            .then_some(seconds as f32)
    }

    /// Applies a runtime change coming from the admin console.
    ///
    /// Returns `false` for keys the engine does not know about,
    /// which are simply passed through to the clients.
    pub fn apply(&mut self, key: &str, value: &Value) -> Result<bool, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.clone(),
        };

        match key {
            Self::FREE_MODE_KEY => self.free_mode = value.as_bool().ok_or_else(invalid)?,
            Self::PREVENT_DUPLICATES_KEY => {
                self.prevent_duplicates = value.as_bool().ok_or_else(invalid)?
            }
            Self::MAX_QUEUE_SIZE_KEY => {
                self.max_queue_size = match value {
                    Value::Null => None,
                    v => Some(v.as_u64().ok_or_else(invalid)? as usize),
                }
            }
            Self::LOAD_TIMEOUT_KEY => {
                self.load_timeout_in_seconds = match value {
                    Value::Null => None,
                    v => Some(
                        v.as_f64()
                            .and_then(Self::valid_load_timeout)
                            .ok_or_else(invalid)?,
                    ),
                }
            }
            _ => return Ok(false),
        }

        Ok(true)
    }
}

impl ModerationConfig {
    /// Returns the categories that should be checked
    pub fn categories(&self) -> Vec<ModerationCategory> {
        [
            (self.check_requester_name, ModerationCategory::RequesterName),
            (self.check_track_title, ModerationCategory::TrackTitle),
            (self.check_dedication, ModerationCategory::Dedication),
        ]
        .into_iter()
        .filter_map(|(enabled, category)| enabled.then_some(category))
        .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            free_mode: false,
            prevent_duplicates: true,
            max_queue_size: Some(100),
            moderation: Default::default(),
            // Slow TVs on restaurant wifi can take a while to buffer
            load_timeout_in_seconds: Some(30.),
            desync_threshold: 5,
            default_volume: 80,
            history_size: 200,
            pending_ttl_in_seconds: 30 * 60,
            max_pending: 500,
            overlay: Default::default(),
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            check_requester_name: true,
            check_track_title: true,
            check_dedication: true,
            action: ModerationAction::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn known_keys_are_applied() {
        let mut config = Config::default();

        assert!(config.apply(Config::FREE_MODE_KEY, &json!(true)).unwrap());
        assert!(config.free_mode);

        assert!(config.apply(Config::MAX_QUEUE_SIZE_KEY, &json!(null)).unwrap());
        assert_eq!(config.max_queue_size, None);

        assert!(config.apply(Config::LOAD_TIMEOUT_KEY, &json!(12)).unwrap());
        assert_eq!(config.load_timeout(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn absurd_load_timeouts_are_refused() {
        let mut config = Config::default();

        for value in [json!(1e39), json!(1e20), json!(-1), json!("30")] {
            assert!(config.apply(Config::LOAD_TIMEOUT_KEY, &value).is_err());
        }
        assert_eq!(config.load_timeout(), Some(Duration::from_secs(30)));

        assert_eq!(Config::valid_load_timeout(f64::INFINITY), None);
        assert_eq!(Config::valid_load_timeout(f64::NAN), None);

        config.load_timeout_in_seconds = Some(f32::INFINITY);
        assert_eq!(config.load_timeout(), None, "never panics");
    }

    #[test]
    fn unknown_keys_pass_through_and_bad_values_fail() {
        let mut config = Config::default();

        assert!(!config.apply("corTema", &json!("azul")).unwrap());
        assert!(config.apply(Config::FREE_MODE_KEY, &json!("sim")).is_err());
        assert!(!config.free_mode, "failed update leaves the config untouched");
    }

    #[test]
    fn disabled_categories_are_skipped() {
        let moderation = ModerationConfig {
            check_track_title: false,
            ..Default::default()
        };

        assert_eq!(
            moderation.categories(),
            vec![
                ModerationCategory::RequesterName,
                ModerationCategory::Dedication
            ]
        );
    }
}
