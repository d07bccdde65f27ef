use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

const SECS_PER_MIN: u16 = 60;
const MINS_PER_HOUR: u8 = 60;
const HOURS_PER_DAY: u8 = 24;

/// Hours/minutes/seconds time of day, as carried on the bus.
///
/// Field order gives the derived `Ord` its hours, minutes, seconds precedence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl ClockTime {
    /// Midnight, 00:00:00.
    pub const MIDNIGHT: Self = Self::new(0, 0, 0);

    /// Builds a time without range checks. Use [`ClockTime::set_explicit`] for
    /// untrusted values.
    pub const fn new(hours: u8, minutes: u8, seconds: u8) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::MIDNIGHT;
    }

    /// Sets all three fields. On any out of range field the time is reset to
    /// midnight and `false` is returned.
    pub fn set_explicit(&mut self, hours: u8, minutes: u8, seconds: u8) -> bool {
        if hours >= HOURS_PER_DAY || minutes >= MINS_PER_HOUR || seconds >= SECS_PER_MIN as u8 {
            debug!("rejected time {=u8}:{=u8}:{=u8}", hours, minutes, seconds);
            self.reset();
            return false;
        }

        self.hours = hours;
        self.minutes = minutes;
        self.seconds = seconds;
        true
    }

    /// [`ClockTime::set_explicit`] with seconds at zero.
    pub fn set_hm(&mut self, hours: u8, minutes: u8) -> bool {
        self.set_explicit(hours, minutes, 0)
    }

    /// Advances by `seconds`, carrying into minutes and hours. Hours wrap at 24.
    pub fn add_seconds(&mut self, seconds: u8) {
        let mut secs = self.seconds as u16 + seconds as u16;
        let mut carry = 0u16;
        while secs >= SECS_PER_MIN {
            carry += 1;
            secs -= SECS_PER_MIN;
        }
        self.seconds = secs as u8;

        let mut mins = self.minutes as u16 + carry;
        let mut hours = self.hours as u16;
        while mins >= MINS_PER_HOUR as u16 {
            hours += 1;
            mins -= MINS_PER_HOUR as u16;
        }
        self.minutes = mins as u8;
        self.hours = (hours % HOURS_PER_DAY as u16) as u8;
    }

    /// Copies `source` with all three fields read inside one critical section,
    /// so a tick interrupt can never be observed halfway through a carry.
    pub fn safe_copy(&mut self, source: &Mutex<Cell<ClockTime>>) {
        *self = critical_section::with(|cs| source.borrow(cs).get());
    }

    /// Seconds since midnight.
    pub fn total_seconds(&self) -> u32 {
        self.hours as u32 * 3600 + self.minutes as u32 * 60 + self.seconds as u32
    }

    /// Hour on a 12 hour dial and whether it is past noon.
    pub fn hour12(&self) -> (u8, bool) {
        let pm = self.hours >= 12;
        match self.hours % 12 {
            0 => (12, pm),
            h => (h, pm),
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::*;

    fn from_total(total: u32) -> ClockTime {
        let total = total % 86_400;
        ClockTime::new(
            (total / 3600) as u8,
            ((total / 60) % 60) as u8,
            (total % 60) as u8,
        )
    }

    #[test]
    fn test_set_explicit_accepts_every_valid_time() {
        let mut t = ClockTime::default();
        for h in 0..24 {
            for m in 0..60 {
                for s in [0, 1, 30, 59] {
                    assert!(t.set_explicit(h, m, s));
                    assert_eq!(t, ClockTime::new(h, m, s));
                }
            }
        }
    }

    #[test]
    fn test_set_explicit_rejects_and_resets() {
        for (h, m, s) in [(24, 0, 0), (0, 60, 0), (0, 0, 60), (255, 255, 255), (23, 59, 60)] {
            let mut t = ClockTime::new(12, 34, 56);
            assert!(!t.set_explicit(h, m, s));
            assert_eq!(t, ClockTime::MIDNIGHT);
        }
    }

    #[test]
    fn test_set_hm_zeroes_seconds() {
        let mut t = ClockTime::new(1, 2, 3);
        assert!(t.set_hm(7, 45));
        assert_eq!(t, ClockTime::new(7, 45, 0));
        assert!(!t.set_hm(7, 60));
        assert_eq!(t, ClockTime::MIDNIGHT);
    }

    #[test]
    fn test_add_seconds_wraps_past_midnight() {
        let mut t = ClockTime::new(23, 59, 58);
        t.add_seconds(5);
        assert_eq!(t, ClockTime::new(0, 0, 3));
    }

    #[test]
    fn test_add_seconds_multiple_minute_carries() {
        let mut t = ClockTime::new(10, 58, 59);
        t.add_seconds(255);
        assert_eq!(t, ClockTime::new(11, 3, 14));
    }

    #[test]
    fn test_add_seconds_matches_modular_arithmetic() {
        let starts = [
            ClockTime::new(0, 0, 0),
            ClockTime::new(0, 59, 59),
            ClockTime::new(11, 59, 1),
            ClockTime::new(12, 0, 0),
            ClockTime::new(23, 55, 30),
            ClockTime::new(23, 59, 59),
        ];
        for start in starts {
            for n in 0..=u8::MAX {
                let mut t = start;
                t.add_seconds(n);
                assert_eq!(t, from_total(start.total_seconds() + n as u32), "{} + {}", start, n);
            }
        }
    }

    #[test]
    fn test_ordering_follows_seconds_since_midnight() {
        let samples = [
            ClockTime::new(0, 0, 0),
            ClockTime::new(0, 0, 59),
            ClockTime::new(0, 1, 0),
            ClockTime::new(0, 59, 59),
            ClockTime::new(1, 0, 0),
            ClockTime::new(12, 30, 15),
            ClockTime::new(23, 59, 59),
        ];
        for a in samples {
            for b in samples {
                assert_eq!(a.cmp(&b), a.total_seconds().cmp(&b.total_seconds()));
                assert_eq!(a == b, a.total_seconds() == b.total_seconds());
            }
        }
    }

    #[test]
    fn test_hour12() {
        assert_eq!(ClockTime::new(0, 0, 0).hour12(), (12, false));
        assert_eq!(ClockTime::new(9, 0, 0).hour12(), (9, false));
        assert_eq!(ClockTime::new(12, 0, 0).hour12(), (12, true));
        assert_eq!(ClockTime::new(23, 0, 0).hour12(), (11, true));
    }

    #[test]
    fn test_safe_copy() {
        let shared = Mutex::new(Cell::new(ClockTime::new(6, 7, 8)));
        let mut t = ClockTime::default();
        t.safe_copy(&shared);
        assert_eq!(t, ClockTime::new(6, 7, 8));
    }

    #[test]
    fn test_display() {
        assert_eq!(ClockTime::new(7, 5, 9).to_string(), "07:05:09");
    }
}
