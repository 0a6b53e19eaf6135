//! Playback is driven by the server, and rendered by the displays.

mod player;
mod watchdog;

pub use player::*;
pub use watchdog::*;
