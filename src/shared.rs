//! [`ClockSync`] behind a critical section, for sharing between a bare tick
//! interrupt handler and thread mode through a `static`.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::clock::ClockTime;
use crate::config::ClockConfig;
use crate::flags::DisplayMode;
use crate::packet::BusPacket;
use crate::sync::ClockSync;

/// Every method runs as one critical section, so packet intake updates fast
/// time, scale and the accumulators as a unit and reads never see a
/// half carried clock.
pub struct SharedClock {
    inner: Mutex<RefCell<ClockSync>>,
}

impl Default for SharedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedClock {
    pub const fn new() -> Self {
        Self::with_config(ClockConfig::new())
    }

    pub const fn with_config(config: ClockConfig) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(ClockSync::with_config(config))),
        }
    }

    /// Runs `f` with the synchronizer locked against the tick interrupt.
    pub fn lock<R>(&self, f: impl FnOnce(&mut ClockSync) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.inner.borrow(cs).borrow_mut()))
    }

    pub fn tick(&self) {
        self.lock(|sync| sync.tick())
    }

    pub fn process_time_packet(&self, packet: &BusPacket) -> bool {
        self.lock(|sync| sync.process_time_packet(packet))
    }

    pub fn get_fast_time(&self, out: &mut ClockTime) -> bool {
        self.lock(|sync| sync.get_fast_time(out))
    }

    pub fn get_real_time(&self, out: &mut ClockTime) -> bool {
        self.lock(|sync| sync.get_real_time(out))
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.lock(|sync| sync.display_mode())
    }

    pub fn is_on_fast_time(&self) -> bool {
        self.lock(|sync| sync.is_on_fast_time())
    }

    pub fn is_on_real_time(&self) -> bool {
        self.lock(|sync| sync.is_on_real_time())
    }

    pub fn is_on_hold(&self) -> bool {
        self.lock(|sync| sync.is_on_hold())
    }

    pub fn is_real_in_12h_display(&self) -> bool {
        self.lock(|sync| sync.is_real_in_12h_display())
    }

    pub fn is_fast_in_12h_display(&self) -> bool {
        self.lock(|sync| sync.is_fast_in_12h_display())
    }

    pub fn is_timed_out(&self) -> bool {
        self.lock(|sync| sync.is_timed_out())
    }

    pub fn set_time_source_address(&self, address: u8) {
        self.lock(|sync| sync.set_time_source_address(address))
    }

    pub fn time_source_address(&self) -> u8 {
        self.lock(|sync| sync.time_source_address())
    }

    pub fn set_timeout(&self, decisecs: u8) {
        self.lock(|sync| sync.set_timeout(decisecs))
    }
}
