//! Runtime settings for the synchronizer and build time settings for the
//! tick hardware.

/// Source address meaning "accept time from anyone".
pub const ANY_TIME_SOURCE: u8 = 0xFF;

/// Deciseconds without a packet before the time is considered stale.
pub const DEFAULT_TIMEOUT_DECISECS: u8 = 50;

/// Logical tick rate the accumulation arithmetic assumes.
pub const LOGICAL_TICK_HZ: u32 = 10;

/// Bus UART speed used by the firmware.
pub const BUS_BAUD: u32 = 57_600;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    /// Zero disables timeout detection.
    pub timeout_decisecs: u8,
    pub time_source: u8,
}

impl ClockConfig {
    pub const fn new() -> Self {
        Self {
            timeout_decisecs: DEFAULT_TIMEOUT_DECISECS,
            time_source: ANY_TIME_SOURCE,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Physical tick interrupt rate and how many of those make one decisecond.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickProfile {
    pub interrupt_hz: u32,
    pub ticks_per_decisec: u8,
}

impl TickProfile {
    /// Slow 8 bit timer setups: 110 Hz divided by 11.
    pub const HZ_110: Self = Self {
        interrupt_hz: 110,
        ticks_per_decisec: 11,
    };

    /// Timer running directly at the logical rate.
    pub const HZ_10: Self = Self {
        interrupt_hz: 10,
        ticks_per_decisec: 1,
    };

    /// Alarm period, truncated to whole microseconds.
    pub const fn period_us(&self) -> u32 {
        1_000_000 / self.interrupt_hz
    }

    /// Logical rate this profile actually produces.
    pub const fn logical_hz(&self) -> u32 {
        self.interrupt_hz / self.ticks_per_decisec as u32
    }
}

#[cfg(feature = "timer-110hz")]
pub const TICK_PROFILE: TickProfile = TickProfile::HZ_110;
#[cfg(not(feature = "timer-110hz"))]
pub const TICK_PROFILE: TickProfile = TickProfile::HZ_10;
