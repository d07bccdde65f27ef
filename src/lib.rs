//! Real time and fast (scale) time clocks for a node on a model railroad bus.
//!
//! Time packets from the bus set both clocks; a decisecond tick interrupt
//! dead reckons fast time in between and ages out stale time.
#![no_std]

#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod divider;
pub mod flags;
pub mod packet;
pub mod shared;
pub mod sync;

pub use clock::ClockTime;
pub use config::{ClockConfig, TickProfile, ANY_TIME_SOURCE, TICK_PROFILE};
pub use divider::TickDivider;
pub use flags::{DisplayFlags, DisplayMode};
pub use packet::{BusPacket, FastSection, PacketError};
pub use shared::SharedClock;
pub use sync::ClockSync;
