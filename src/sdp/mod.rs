//! Service Discovery Protocol (SDP) client side
//!
//! The Bluetooth stack runs the SDP query and streams the attribute values of
//! the matching HID record back one byte at a time. This module reassembles
//! those bytes and extracts what is needed to open the HID channels.

pub mod collector;
pub mod element;

pub use collector::{
    AttributeByte, HidDescriptor, ParsedAttribute, SdpAttributeCollector, ServicePsms,
};
pub use element::{DataElement, DataElementType, Sequence};

/// SDP Error Types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SdpError {
    /// Declared attribute length exceeds the reassembly buffer
    AttributeTooLarge {
        /// Length announced by the remote
        required: u16,
        /// Reassembly buffer capacity
        available: u16,
    },
    /// Byte offset lies outside the declared attribute length
    OffsetOutOfRange,
    /// No HID Control PSM was found during the query
    MissingControlPsm,
    /// No HID Interrupt PSM was found during the query
    MissingInterruptPsm,
    /// Malformed data element
    InvalidData,
}

impl core::fmt::Display for SdpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AttributeTooLarge {
                required,
                available,
            } => write!(
                f,
                "SDP attribute value buffer size exceeded: available {available}, required {required}"
            ),
            Self::OffsetOutOfRange => write!(f, "SDP attribute byte offset out of range"),
            Self::MissingControlPsm => write!(f, "HID Control PSM missing"),
            Self::MissingInterruptPsm => write!(f, "HID Interrupt PSM missing"),
            Self::InvalidData => write!(f, "Malformed SDP data element"),
        }
    }
}
