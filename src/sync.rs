//! Real and fast clock state driven by bus time packets and the decisecond tick.
//!
//! [`ClockSync`] takes `&mut self` everywhere. Whoever owns it is responsible
//! for keeping the tick interrupt out while packet intake or a read runs; in
//! the firmware that is the RTIC resource lock, elsewhere [`SharedClock`].
//!
//! [`SharedClock`]: crate::shared::SharedClock

use crate::clock::ClockTime;
use crate::config::{ClockConfig, ANY_TIME_SOURCE};
use crate::flags::{DisplayFlags, DisplayMode};
use crate::packet::BusPacket;

/// Carry threshold for the tenths accumulator. The carry only happens once
/// the accumulator is strictly above this, so it can sit at exactly 10 for a
/// tick.
const TENTHS_CARRY_ABOVE: u8 = 10;

#[derive(Debug)]
pub struct ClockSync {
    real_time: ClockTime,
    fast_time: ClockTime,
    flags: DisplayFlags,
    /// Tenths of a fast second per tick; 10 is real speed.
    scale_factor: u16,
    /// Whole deciseconds of fast time not yet applied to `fast_time`.
    fast_decisecs: u16,
    /// Tenths of a fast decisecond, from the `scale_factor % 10` remainder.
    scale_tenths: u8,
    timeout_remaining: u8,
    config: ClockConfig,
}

impl Default for ClockSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSync {
    pub const fn new() -> Self {
        Self::with_config(ClockConfig::new())
    }

    /// Starts timed out (if timeout is enabled) until the first packet.
    pub const fn with_config(config: ClockConfig) -> Self {
        Self {
            real_time: ClockTime::MIDNIGHT,
            fast_time: ClockTime::MIDNIGHT,
            flags: DisplayFlags::empty(),
            scale_factor: 0,
            fast_decisecs: 0,
            scale_tenths: 0,
            timeout_remaining: 0,
            config,
        }
    }

    /// Takes a time packet from the bus. Returns false, touching nothing, if
    /// it came from a source other than the configured one.
    pub fn process_time_packet(&mut self, packet: &BusPacket) -> bool {
        let source = self.config.time_source;
        if source != ANY_TIME_SOURCE && packet.src() != source {
            debug!("ignoring time from {=u8}, listening to {=u8}", packet.src(), source);
            return false;
        }

        // real time changes too slowly to need dead reckoning
        self.real_time = packet.real_time();
        self.flags = packet.flags();

        match packet.fast_section() {
            Some(fast) => {
                self.fast_time = fast.time;
                self.scale_factor = fast.scale;
            }
            None => {
                debug!("time packet from {=u8} has no fast section", packet.src());
                self.fast_time.reset();
                self.scale_factor = 0;
            }
        }

        self.fast_decisecs = 0;
        self.scale_tenths = 0;
        self.timeout_remaining = self.config.timeout_decisecs;

        trace!(
            "time from {=u8}: real {} fast {} x{=u16}/10",
            packet.src(),
            self.real_time,
            self.fast_time,
            self.scale_factor
        );
        true
    }

    /// Logical decisecond tick. Runs in interrupt context.
    pub fn tick(&mut self) {
        if self.timeout_remaining != 0 {
            self.timeout_remaining -= 1;
            if self.timeout_remaining == 0 && self.config.timeout_decisecs != 0 {
                warn!("no time packet for {=u8} deciseconds", self.config.timeout_decisecs);
            }
        }

        if self.flags.mode() != DisplayMode::FastTime {
            return;
        }

        self.fast_decisecs += self.scale_factor / 10;
        self.scale_tenths += (self.scale_factor % 10) as u8;
        if self.scale_tenths > TENTHS_CARRY_ABOVE {
            self.fast_decisecs += 1;
            self.scale_tenths -= 10;
        }

        if self.fast_decisecs >= 10 {
            let secs = self.fast_decisecs / 10;
            self.fast_decisecs -= secs * 10;
            self.advance_fast(secs);
        }
    }

    fn advance_fast(&mut self, mut secs: u16) {
        while secs > 0 {
            let step = secs.min(u8::MAX as u16);
            self.fast_time.add_seconds(step as u8);
            secs -= step;
        }
    }

    pub fn display_flags(&self) -> DisplayFlags {
        self.flags
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.flags.mode()
    }

    pub fn is_on_fast_time(&self) -> bool {
        self.display_mode() == DisplayMode::FastTime
    }

    pub fn is_on_real_time(&self) -> bool {
        self.display_mode() == DisplayMode::RealTime
    }

    pub fn is_on_hold(&self) -> bool {
        self.display_mode() == DisplayMode::FastHold
    }

    pub fn is_real_in_12h_display(&self) -> bool {
        self.flags.is_real_12h()
    }

    pub fn is_fast_in_12h_display(&self) -> bool {
        self.flags.is_fast_12h()
    }

    pub fn scale_factor(&self) -> u16 {
        self.scale_factor
    }

    /// Never true while the configured timeout is zero.
    pub fn is_timed_out(&self) -> bool {
        self.config.timeout_decisecs != 0 && self.timeout_remaining == 0
    }

    /// Copies fast time into `out`. When timed out, writes midnight and
    /// returns false.
    pub fn get_fast_time(&self, out: &mut ClockTime) -> bool {
        self.copy_unless_timed_out(self.fast_time, out)
    }

    /// Copies real time into `out`. When timed out, writes midnight and
    /// returns false.
    pub fn get_real_time(&self, out: &mut ClockTime) -> bool {
        self.copy_unless_timed_out(self.real_time, out)
    }

    fn copy_unless_timed_out(&self, time: ClockTime, out: &mut ClockTime) -> bool {
        if self.is_timed_out() {
            out.reset();
            return false;
        }

        *out = time;
        true
    }

    /// [`ANY_TIME_SOURCE`] accepts packets from every node.
    pub fn set_time_source_address(&mut self, address: u8) {
        self.config.time_source = address;
    }

    pub fn time_source_address(&self) -> u8 {
        self.config.time_source
    }

    /// Sets the timeout used from the next accepted packet on. Zero disables
    /// timeout detection.
    pub fn set_timeout(&mut self, decisecs: u8) {
        self.config.timeout_decisecs = decisecs;
    }

    pub fn timeout(&self) -> u8 {
        self.config.timeout_decisecs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::FastSection;

    const SOURCE: u8 = 0x21;

    fn fast_packet(src: u8, flags: DisplayFlags, fast: ClockTime, scale: u16) -> BusPacket {
        BusPacket::time(
            src,
            0xFF,
            ClockTime::new(14, 0, 0),
            flags,
            Some(FastSection { time: fast, scale }),
        )
    }

    fn running(scale: u16) -> ClockSync {
        let mut sync = ClockSync::new();
        assert!(sync.process_time_packet(&fast_packet(
            SOURCE,
            DisplayFlags::FAST,
            ClockTime::new(6, 0, 0),
            scale,
        )));
        sync
    }

    fn fast_now(sync: &ClockSync) -> ClockTime {
        let mut t = ClockTime::default();
        assert!(sync.get_fast_time(&mut t));
        t
    }

    #[test]
    fn test_new_is_timed_out_until_first_packet() {
        let sync = ClockSync::new();
        assert!(sync.is_timed_out());
        assert!(sync.is_on_real_time());
        assert_eq!(sync.time_source_address(), ANY_TIME_SOURCE);
        assert_eq!(sync.timeout(), 50);
    }

    #[test]
    fn test_packet_sets_both_clocks() {
        let mut sync = ClockSync::new();
        let pkt = fast_packet(
            SOURCE,
            DisplayFlags::FAST | DisplayFlags::FAST_12H,
            ClockTime::new(8, 30, 15),
            600,
        );
        assert!(sync.process_time_packet(&pkt));

        let mut real = ClockTime::default();
        assert!(sync.get_real_time(&mut real));
        assert_eq!(real, ClockTime::new(14, 0, 0));
        assert_eq!(fast_now(&sync), ClockTime::new(8, 30, 15));
        assert_eq!(sync.scale_factor(), 600);
        assert!(sync.is_on_fast_time());
        assert!(sync.is_fast_in_12h_display());
        assert!(!sync.is_real_in_12h_display());
        assert!(!sync.is_timed_out());
    }

    #[test]
    fn test_filtered_source_changes_nothing() {
        let mut sync = running(600);
        sync.set_time_source_address(SOURCE);
        sync.tick();

        let before_fast = sync.fast_time;
        let before_decisecs = sync.fast_decisecs;
        let before_remaining = sync.timeout_remaining;

        let other = fast_packet(0x22, DisplayFlags::FAST_HOLD, ClockTime::new(1, 1, 1), 10);
        assert!(!sync.process_time_packet(&other));

        assert_eq!(sync.fast_time, before_fast);
        assert_eq!(sync.fast_decisecs, before_decisecs);
        assert_eq!(sync.timeout_remaining, before_remaining);
        assert_eq!(sync.real_time, ClockTime::new(14, 0, 0));
        assert_eq!(sync.flags, DisplayFlags::FAST);
        assert_eq!(sync.scale_factor, 600);
    }

    #[test]
    fn test_matching_source_accepted() {
        let mut sync = ClockSync::new();
        sync.set_time_source_address(SOURCE);
        let pkt = fast_packet(SOURCE, DisplayFlags::FAST, ClockTime::new(1, 2, 3), 10);
        assert!(sync.process_time_packet(&pkt));
        assert_eq!(fast_now(&sync), ClockTime::new(1, 2, 3));
    }

    #[test]
    fn test_short_packet_clears_fast_time_and_scale() {
        let mut sync = running(600);
        let short = BusPacket::time(
            SOURCE,
            0xFF,
            ClockTime::new(9, 9, 9),
            DisplayFlags::empty(),
            None,
        );
        assert!(sync.process_time_packet(&short));

        assert_eq!(fast_now(&sync), ClockTime::MIDNIGHT);
        assert_eq!(sync.scale_factor(), 0);
        assert!(sync.is_on_real_time());
    }

    #[test]
    fn test_packet_discards_dead_reckoning() {
        let mut sync = running(13);
        sync.tick();
        sync.tick();
        assert!(sync.fast_decisecs != 0 || sync.scale_tenths != 0);

        let again = fast_packet(SOURCE, DisplayFlags::FAST, ClockTime::new(6, 0, 0), 13);
        sync.process_time_packet(&again);
        assert_eq!(sync.fast_decisecs, 0);
        assert_eq!(sync.scale_tenths, 0);
    }

    #[test]
    fn test_sixty_to_one_advances_a_minute_per_second() {
        let mut sync = running(600);
        for _ in 0..10 {
            sync.tick();
        }
        assert_eq!(fast_now(&sync), ClockTime::new(6, 1, 0));
    }

    #[test]
    fn test_real_speed_advances_one_second_per_ten_ticks() {
        let mut sync = running(10);
        for _ in 0..9 {
            sync.tick();
        }
        assert_eq!(fast_now(&sync), ClockTime::new(6, 0, 0));
        sync.tick();
        assert_eq!(fast_now(&sync), ClockTime::new(6, 0, 1));
    }

    #[test]
    fn test_tenths_carry_only_above_ten() {
        // 0.5 deciseconds per tick: accumulator goes 5, 10, 15 -> carry, 5
        let mut sync = running(5);
        sync.tick();
        assert_eq!((sync.fast_decisecs, sync.scale_tenths), (0, 5));
        sync.tick();
        assert_eq!((sync.fast_decisecs, sync.scale_tenths), (0, 10));
        sync.tick();
        assert_eq!((sync.fast_decisecs, sync.scale_tenths), (1, 5));
    }

    #[test]
    fn test_fractional_scale_keeps_accumulator_bounded() {
        let mut sync = running(37);
        for _ in 0..1000 {
            sync.tick();
            assert!(sync.scale_tenths <= 10);
            assert!(sync.fast_decisecs < 10);
        }
    }

    #[test]
    fn test_huge_scale_applies_all_seconds() {
        // 65535 tenths per tick is 6553 deciseconds, 655 whole seconds
        let mut sync = running(u16::MAX);
        sync.tick();
        assert_eq!(fast_now(&sync), ClockTime::new(6, 10, 55));
        assert_eq!(sync.fast_decisecs, 3);
        assert_eq!(sync.scale_tenths, 5);
    }

    #[test]
    fn test_no_dead_reckoning_outside_fast_mode() {
        for flags in [
            DisplayFlags::empty(),
            DisplayFlags::FAST | DisplayFlags::FAST_HOLD,
            DisplayFlags::FAST_HOLD,
        ] {
            let mut sync = ClockSync::new();
            sync.process_time_packet(&fast_packet(SOURCE, flags, ClockTime::new(6, 0, 0), 600));
            for _ in 0..20 {
                sync.tick();
            }
            assert_eq!(fast_now(&sync), ClockTime::new(6, 0, 0));
            assert_eq!(sync.fast_decisecs, 0);
        }
    }

    #[test]
    fn test_mode_queries() {
        let mut sync = ClockSync::new();

        let hold = DisplayFlags::FAST | DisplayFlags::FAST_HOLD;
        sync.process_time_packet(&fast_packet(SOURCE, hold, ClockTime::MIDNIGHT, 10));
        assert!(sync.is_on_hold());
        assert!(!sync.is_on_fast_time());
        assert!(!sync.is_on_real_time());

        let odd = DisplayFlags::FAST_HOLD;
        sync.process_time_packet(&fast_packet(SOURCE, odd, ClockTime::MIDNIGHT, 10));
        assert_eq!(sync.display_mode(), DisplayMode::Unknown);
        assert!(!sync.is_on_hold());
        assert!(!sync.is_on_fast_time());
        assert!(!sync.is_on_real_time());
    }

    #[test]
    fn test_timeout_counts_down_per_tick() {
        let mut sync = ClockSync::new();
        sync.set_timeout(3);
        let pkt = fast_packet(SOURCE, DisplayFlags::empty(), ClockTime::MIDNIGHT, 0);
        sync.process_time_packet(&pkt);
        assert!(!sync.is_timed_out());

        sync.tick();
        sync.tick();
        assert!(!sync.is_timed_out());
        sync.tick();
        assert!(sync.is_timed_out());

        let mut out = ClockTime::new(1, 1, 1);
        assert!(!sync.get_real_time(&mut out));
        assert_eq!(out, ClockTime::MIDNIGHT);
        let mut out = ClockTime::new(1, 1, 1);
        assert!(!sync.get_fast_time(&mut out));
        assert_eq!(out, ClockTime::MIDNIGHT);

        sync.process_time_packet(&pkt);
        assert!(!sync.is_timed_out());
    }

    #[test]
    fn test_zero_timeout_never_times_out() {
        let mut sync = ClockSync::new();
        sync.set_timeout(0);
        assert!(!sync.is_timed_out());
        let pkt = fast_packet(SOURCE, DisplayFlags::FAST, ClockTime::MIDNIGHT, 10);
        sync.process_time_packet(&pkt);
        for _ in 0..1000 {
            sync.tick();
        }
        assert!(!sync.is_timed_out());
        let mut out = ClockTime::default();
        assert!(sync.get_real_time(&mut out));
    }
}
