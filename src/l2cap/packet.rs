//! L2CAP basic frame parsing
//!
//! Incoming data on the HID channels arrives as L2CAP basic frames: a 4-byte
//! little-endian header carrying the payload length and destination channel,
//! followed by the payload.

use heapless::Vec;

/// L2CAP packet parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum L2capError {
    /// Packet data is too short (insufficient bytes for header or payload)
    InsufficientData,
    /// Payload exceeds buffer capacity
    PayloadTooLarge,
}

impl core::fmt::Display for L2capError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InsufficientData => write!(f, "Insufficient data for L2CAP packet"),
            Self::PayloadTooLarge => write!(f, "L2CAP payload exceeds buffer capacity"),
        }
    }
}

/// L2CAP Channel Identifier (CID)
///
/// 0x0000 is never a valid channel, 0x0001-0x003F are fixed channels and
/// 0x0040-0xFFFF are allocated when a connection-oriented channel opens.
pub type ChannelId = u16;

/// L2CAP Protocol Service Multiplexer (PSM)
pub type ProtocolServiceMultiplexer = u16;

/// L2CAP reserved channel identifiers
pub mod cid {
    use super::ChannelId;

    /// Reserved - shall not be used
    pub const NULL: ChannelId = 0x0000;
}

/// Well-known Protocol Service Multiplexers
pub mod psm {
    use super::ProtocolServiceMultiplexer;

    /// HID Control channel
    pub const HID_CONTROL: ProtocolServiceMultiplexer = 0x0011;
    /// HID Interrupt channel
    pub const HID_INTERRUPT: ProtocolServiceMultiplexer = 0x0013;
}

/// L2CAP Basic Header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct L2capHeader {
    /// Length of the payload (not including the header itself)
    pub length: u16,
    /// Channel identifier of the intended recipient
    pub channel_id: ChannelId,
}

impl L2capHeader {
    /// Size of the L2CAP header in bytes
    pub const HEADER_SIZE: usize = 4;

    /// Parse L2CAP header from byte slice
    ///
    /// # Errors
    /// Returns `L2capError::InsufficientData` if the slice is less than 4 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, L2capError> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(L2capError::InsufficientData);
        }

        Ok(Self {
            length: u16::from_le_bytes([bytes[0], bytes[1]]),
            channel_id: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

/// L2CAP basic frame with an owned, bounded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2capPacket<const N: usize> {
    /// L2CAP header
    pub header: L2capHeader,
    /// Packet payload
    pub payload: Vec<u8, N>,
}

impl<const N: usize> L2capPacket<N> {
    /// Parse a basic frame from raw bytes
    ///
    /// Bytes past the length announced in the header are ignored.
    ///
    /// # Errors
    /// Returns `L2capError` if:
    /// - The slice is too short for the header
    /// - The actual payload is shorter than indicated in the header
    /// - The payload exceeds the buffer capacity
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, L2capError> {
        let header = L2capHeader::from_bytes(bytes)?;
        let end = L2capHeader::HEADER_SIZE + header.length as usize;
        let payload = bytes
            .get(L2capHeader::HEADER_SIZE..end)
            .ok_or(L2capError::InsufficientData)?;

        Ok(Self {
            header,
            payload: Vec::from_slice(payload).map_err(|()| L2capError::PayloadTooLarge)?,
        })
    }

    /// Destination channel of this frame
    #[must_use]
    pub fn channel_id(&self) -> ChannelId {
        self.header.channel_id
    }
}
