use crate::config::TickProfile;

/// Cuts a fast physical tick interrupt down to the logical decisecond tick.
#[derive(Debug)]
pub struct TickDivider {
    reload: u8,
    remaining: u8,
}

impl TickDivider {
    pub const fn new(ticks_per_decisec: u8) -> Self {
        // a divisor of zero would never fire
        let reload = if ticks_per_decisec == 0 { 1 } else { ticks_per_decisec };
        Self {
            reload,
            remaining: reload,
        }
    }

    pub const fn from_profile(profile: TickProfile) -> Self {
        Self::new(profile.ticks_per_decisec)
    }

    /// Call once per physical interrupt. Returns true when a logical tick is due.
    pub fn on_interrupt(&mut self) -> bool {
        self.remaining -= 1;
        if self.remaining != 0 {
            return false;
        }

        self.remaining = self.reload;
        true
    }
}
