use bitflags::bitflags;

bitflags! {
    /// Display flag byte as it appears on the wire.
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct DisplayFlags: u8 {
        const FAST = 1 << 0;
        const FAST_HOLD = 1 << 1;
        const REAL_12H = 1 << 2;
        const FAST_12H = 1 << 3;
    }
}

const MODE_MASK: DisplayFlags = DisplayFlags::FAST.union(DisplayFlags::FAST_HOLD);

/// Which clock a display should be showing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayMode {
    RealTime,
    FastTime,
    FastHold,
    /// Hold without fast. Never sent by a well behaved time source.
    Unknown,
}

impl DisplayMode {
    pub fn from_flags(flags: DisplayFlags) -> Self {
        let mode = flags & MODE_MASK;
        if mode == DisplayFlags::FAST {
            DisplayMode::FastTime
        } else if mode == MODE_MASK {
            DisplayMode::FastHold
        } else if mode.is_empty() {
            DisplayMode::RealTime
        } else {
            DisplayMode::Unknown
        }
    }
}

impl DisplayFlags {
    /// Keeps unknown bits so the byte read back matches what was received.
    pub fn from_wire(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    pub fn mode(self) -> DisplayMode {
        DisplayMode::from_flags(self)
    }

    pub fn is_real_12h(self) -> bool {
        self.contains(DisplayFlags::REAL_12H)
    }

    pub fn is_fast_12h(self) -> bool {
        self.contains(DisplayFlags::FAST_12H)
    }
}
