use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Timings of the overlays shown on top of the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// How close to the end of a track the next song banner appears
    pub next_song_threshold_in_seconds: f32,
    /// How long the dedication is shown after a track starts
    pub dedication_duration_in_seconds: f32,
    /// How long a change must hold before it is shown
    pub debounce_in_seconds: f32,
}

/// The playback telemetry overlays are derived from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverlayInput {
    /// The position in the current track, in seconds
    pub current_time: f32,
    pub duration: Option<f32>,
    pub queue_length: usize,
    pub has_current: bool,
    pub has_dedication: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayFlags {
    pub next_song: bool,
    pub dedication: bool,
    pub qr_code: bool,
}

impl OverlayFlags {
    /// Nothing is playing, so only the QR code is up
    pub fn idle() -> Self {
        Self {
            qr_code: true,
            ..Default::default()
        }
    }
}

/// Derives which overlays should be visible right now.
pub fn schedule_overlays(config: &OverlayConfig, input: &OverlayInput) -> OverlayFlags {
    if !input.has_current {
        return OverlayFlags::idle();
    }

    let remaining = input.duration.map(|d| d - input.current_time);
    let next_song = input.queue_length > 0
        && remaining.is_some_and(|r| r <= config.next_song_threshold_in_seconds);

    let dedication = input.has_dedication
        && input.current_time >= 0.
        && input.current_time < config.dedication_duration_in_seconds;

    OverlayFlags {
        next_song,
        dedication,
        qr_code: false,
    }
}

/// Holds the flags on screen, and only flips them once a new value held for the debounce time.
/// Position reports jitter, and without this a banner could flicker at its threshold.
#[derive(Debug, Clone)]
pub struct OverlayScheduler {
    config: OverlayConfig,
    shown: OverlayFlags,
    pending: Option<(OverlayFlags, Instant)>,
}

impl OverlayScheduler {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            shown: OverlayFlags::idle(),
            pending: None,
        }
    }

    pub fn set_config(&mut self, config: OverlayConfig) {
        self.config = config;
    }

    /// Returns the flags currently shown
    pub fn flags(&self) -> OverlayFlags {
        self.shown
    }

    /// Re-derives the flags from the input, returning the flags to show.
    pub fn tick(&mut self, now: Instant, input: &OverlayInput) -> OverlayFlags {
        let target = schedule_overlays(&self.config, input);
        let debounce = Duration::from_secs_f32(self.config.debounce_in_seconds.max(0.));

        if target == self.shown {
            self.pending = None;
            return self.shown;
        }

        match self.pending {
            Some((flags, since)) if flags == target => {
                if now.saturating_duration_since(since) >= debounce {
                    self.shown = target;
                    self.pending = None;
                }
            }
            _ if debounce.is_zero() => self.shown = target,
            _ => self.pending = Some((target, now)),
        }

        self.shown
    }

    /// Drops any pending change, used when the current item changes
    pub fn reset(&mut self) {
        self.pending = None;
        self.shown = OverlayFlags::idle();
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            next_song_threshold_in_seconds: 10.,
            dedication_duration_in_seconds: 15.,
            debounce_in_seconds: 0.5,
        }
    }
}
