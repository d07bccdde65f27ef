//! Fixed layout bus packets.
//!
//! The transport below us has already checked framing and CRC. A packet is
//! kept in a full size buffer, so reading a field past the received length
//! yields a stale zero rather than a panic.

use core::fmt;

use crate::clock::ClockTime;
use crate::flags::DisplayFlags;

/// Largest packet the bus carries.
pub const MAX_PACKET_LEN: usize = 20;

pub const PKT_DEST: usize = 0;
pub const PKT_SRC: usize = 1;
pub const PKT_LEN: usize = 2;
pub const PKT_CRC_L: usize = 3;
pub const PKT_CRC_H: usize = 4;
pub const PKT_TYPE: usize = 5;

pub const TIME_REAL_HOURS: usize = 6;
pub const TIME_REAL_MINUTES: usize = 7;
pub const TIME_REAL_SECONDS: usize = 8;
pub const TIME_FLAGS: usize = 9;
pub const TIME_FAST_HOURS: usize = 10;
pub const TIME_FAST_MINUTES: usize = 11;
pub const TIME_FAST_SECONDS: usize = 12;
pub const TIME_SCALE_HI: usize = 13;
pub const TIME_SCALE_LO: usize = 14;

/// Length from which a time packet carries the fast time section.
pub const TIME_FAST_SECTION_LEN: u8 = 14;

/// Bytes needed for a time packet without the fast section.
const TIME_MIN_LEN: usize = TIME_FLAGS + 1;

/// Type byte of a time packet.
pub const TIME_PACKET_TYPE: u8 = b'T';

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// More bytes than the bus allows in one packet.
    TooLong { len: usize },
    /// Not enough bytes for the mandatory time section.
    Truncated { len: usize },
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::TooLong { len } => {
                write!(f, "packet of {} bytes exceeds bus maximum of {}", len, MAX_PACKET_LEN)
            }
            PacketError::Truncated { len } => {
                write!(f, "packet of {} bytes is too short for a time packet", len)
            }
        }
    }
}

/// Fast section of a time packet: fast time and scale factor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FastSection {
    pub time: ClockTime,
    pub scale: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusPacket {
    pkt: [u8; MAX_PACKET_LEN],
}

impl BusPacket {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() > MAX_PACKET_LEN {
            return Err(PacketError::TooLong { len: bytes.len() });
        }
        if bytes.len() < TIME_MIN_LEN {
            return Err(PacketError::Truncated { len: bytes.len() });
        }

        let mut pkt = [0u8; MAX_PACKET_LEN];
        pkt[..bytes.len()].copy_from_slice(bytes);
        Ok(Self { pkt })
    }

    /// Encodes a time packet. The CRC bytes are left zero for the transport
    /// to fill in.
    pub fn time(
        src: u8,
        dest: u8,
        real: ClockTime,
        flags: DisplayFlags,
        fast: Option<FastSection>,
    ) -> Self {
        let mut pkt = [0u8; MAX_PACKET_LEN];
        pkt[PKT_DEST] = dest;
        pkt[PKT_SRC] = src;
        pkt[PKT_TYPE] = TIME_PACKET_TYPE;
        pkt[TIME_REAL_HOURS] = real.hours;
        pkt[TIME_REAL_MINUTES] = real.minutes;
        pkt[TIME_REAL_SECONDS] = real.seconds;
        pkt[TIME_FLAGS] = flags.bits();

        match fast {
            Some(fast) => {
                pkt[TIME_FAST_HOURS] = fast.time.hours;
                pkt[TIME_FAST_MINUTES] = fast.time.minutes;
                pkt[TIME_FAST_SECONDS] = fast.time.seconds;
                let [hi, lo] = fast.scale.to_be_bytes();
                pkt[TIME_SCALE_HI] = hi;
                pkt[TIME_SCALE_LO] = lo;
                pkt[PKT_LEN] = (TIME_SCALE_LO + 1) as u8;
            }
            None => pkt[PKT_LEN] = TIME_MIN_LEN as u8,
        }

        Self { pkt }
    }

    pub fn dest(&self) -> u8 {
        self.pkt[PKT_DEST]
    }

    pub fn src(&self) -> u8 {
        self.pkt[PKT_SRC]
    }

    /// Length byte as sent, not the number of bytes received.
    pub fn length(&self) -> u8 {
        self.pkt[PKT_LEN]
    }

    pub fn packet_type(&self) -> u8 {
        self.pkt[PKT_TYPE]
    }

    pub fn as_bytes(&self) -> &[u8] {
        let len = (self.length() as usize).min(MAX_PACKET_LEN);
        &self.pkt[..len]
    }

    pub fn real_time(&self) -> ClockTime {
        ClockTime::new(
            self.pkt[TIME_REAL_HOURS],
            self.pkt[TIME_REAL_MINUTES],
            self.pkt[TIME_REAL_SECONDS],
        )
    }

    pub fn flags(&self) -> DisplayFlags {
        DisplayFlags::from_wire(self.pkt[TIME_FLAGS])
    }

    /// Fast time and scale, if the length byte says the section is present.
    pub fn fast_section(&self) -> Option<FastSection> {
        if self.length() < TIME_FAST_SECTION_LEN {
            return None;
        }

        Some(FastSection {
            time: ClockTime::new(
                self.pkt[TIME_FAST_HOURS],
                self.pkt[TIME_FAST_MINUTES],
                self.pkt[TIME_FAST_SECONDS],
            ),
            scale: u16::from_be_bytes([self.pkt[TIME_SCALE_HI], self.pkt[TIME_SCALE_LO]]),
        })
    }
}
