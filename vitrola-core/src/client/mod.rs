//! The client side of the jukebox: what a display does with the messages it receives.

mod bus;
mod display;
mod overlay;
mod projection;

pub use bus::*;
pub use display::*;
pub use overlay::*;
pub use projection::*;
