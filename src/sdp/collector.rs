//! SDP attribute reassembly and HID record extraction
//!
//! The stack reports every attribute value byte with its offset and the total
//! attribute length. Bytes are stored in a fixed buffer until the last one
//! arrives, then the attribute is parsed:
//!
//! * Protocol Descriptor List: `DES { DES { UUID L2CAP, UINT16 psm }, ... }`
//!   yields the HID Control PSM.
//! * Additional Protocol Descriptor Lists: the same shape one level deeper
//!   yields the HID Interrupt PSM.
//! * HID Descriptor List: `DES { DES { UINT8 type, STRING descriptor } }`
//!   yields the HID report descriptor.
//!
//! Malformed structures are skipped at every level.

use super::{
    SdpError,
    element::{DataElement, DataElementType, Sequence},
};
use crate::{
    constants::{
        ATTRIBUTE_ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS, ATTRIBUTE_HID_DESCRIPTOR_LIST,
        ATTRIBUTE_PROTOCOL_DESCRIPTOR_LIST, L2CAP_PROTOCOL_UUID, MAX_ATTRIBUTE_VALUE_SIZE,
    },
    l2cap::ProtocolServiceMultiplexer,
};
use heapless::Vec;

/// One attribute value byte delivered by an SDP query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttributeByte {
    /// Attribute the byte belongs to
    pub attribute_id: u16,
    /// Total length of the attribute value
    pub attribute_length: u16,
    /// Position of this byte in the attribute value
    pub offset: u16,
    /// The byte itself
    pub data: u8,
}

/// Attribute parsed when its last byte arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParsedAttribute {
    /// Protocol Descriptor List, with the control PSM if one was found
    ProtocolDescriptorList(Option<ProtocolServiceMultiplexer>),
    /// Additional Protocol Descriptor Lists, with the interrupt PSM if one was found
    AdditionalProtocolDescriptorLists(Option<ProtocolServiceMultiplexer>),
    /// HID Descriptor List, with the stored descriptor length
    HidDescriptorList(usize),
    /// Any other attribute, complete but not interpreted
    Other(u16),
}

/// PSMs of both HID channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServicePsms {
    /// HID Control PSM
    pub control: ProtocolServiceMultiplexer,
    /// HID Interrupt PSM
    pub interrupt: ProtocolServiceMultiplexer,
}

/// HID report descriptor copied from the HID Descriptor List
///
/// Kept for completeness; the report processor does not interpret it.
pub type HidDescriptor = Vec<u8, MAX_ATTRIBUTE_VALUE_SIZE>;

/// Reassembles attribute values and keeps what the HID host needs
#[derive(Debug)]
pub struct SdpAttributeCollector {
    buffer: [u8; MAX_ATTRIBUTE_VALUE_SIZE],
    control_psm: Option<ProtocolServiceMultiplexer>,
    interrupt_psm: Option<ProtocolServiceMultiplexer>,
    hid_descriptor: HidDescriptor,
}

impl SdpAttributeCollector {
    /// Create an empty collector
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; MAX_ATTRIBUTE_VALUE_SIZE],
            control_psm: None,
            interrupt_psm: None,
            hid_descriptor: Vec::new(),
        }
    }

    /// Forget everything found by a previous query
    pub fn reset(&mut self) {
        self.control_psm = None;
        self.interrupt_psm = None;
        self.hid_descriptor.clear();
    }

    /// HID Control PSM found so far
    #[must_use]
    pub const fn control_psm(&self) -> Option<ProtocolServiceMultiplexer> {
        self.control_psm
    }

    /// HID Interrupt PSM found so far
    #[must_use]
    pub const fn interrupt_psm(&self) -> Option<ProtocolServiceMultiplexer> {
        self.interrupt_psm
    }

    /// Stored HID report descriptor
    #[must_use]
    pub fn hid_descriptor(&self) -> &[u8] {
        &self.hid_descriptor
    }

    /// Store one attribute byte, parsing the attribute once it is complete
    ///
    /// Returns `Ok(Some(_))` exactly when this byte completed the attribute.
    ///
    /// # Errors
    /// Returns `SdpError::AttributeTooLarge` if the attribute cannot fit the
    /// reassembly buffer and `SdpError::OffsetOutOfRange` if the offset lies
    /// past the declared length. Nothing is written in either case.
    pub fn feed(&mut self, byte: &AttributeByte) -> Result<Option<ParsedAttribute>, SdpError> {
        let length = usize::from(byte.attribute_length);
        let offset = usize::from(byte.offset);

        if length > self.buffer.len() {
            return Err(SdpError::AttributeTooLarge {
                required: byte.attribute_length,
                available: MAX_ATTRIBUTE_VALUE_SIZE as u16,
            });
        }
        if offset >= length {
            return Err(SdpError::OffsetOutOfRange);
        }

        self.buffer[offset] = byte.data;
        if offset + 1 != length {
            return Ok(None);
        }

        Ok(Some(self.parse(byte.attribute_id, length)))
    }

    /// Check the query outcome once the stack reports completion
    ///
    /// A PSM of zero is treated as missing.
    ///
    /// # Errors
    /// Returns `SdpError::MissingControlPsm` or `SdpError::MissingInterruptPsm`
    pub fn complete(&self) -> Result<ServicePsms, SdpError> {
        let control = self
            .control_psm
            .filter(|&psm| psm != 0)
            .ok_or(SdpError::MissingControlPsm)?;
        let interrupt = self
            .interrupt_psm
            .filter(|&psm| psm != 0)
            .ok_or(SdpError::MissingInterruptPsm)?;
        Ok(ServicePsms { control, interrupt })
    }

    fn parse(&mut self, attribute_id: u16, length: usize) -> ParsedAttribute {
        let value = &self.buffer[..length];
        let lists = DataElement::parse(value)
            .map(|attribute| attribute.iter())
            .unwrap_or(Sequence::new(&[]));

        match attribute_id {
            ATTRIBUTE_PROTOCOL_DESCRIPTOR_LIST => {
                if let Some(psm) = l2cap_psm(lists) {
                    debug!("[SDP] HID Control PSM: 0x{:04X}", psm);
                    self.control_psm = Some(psm);
                }
                ParsedAttribute::ProtocolDescriptorList(self.control_psm)
            }
            ATTRIBUTE_ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS => {
                let found = lists
                    .filter(|list| list.element_type() == DataElementType::Sequence)
                    .filter_map(|list| l2cap_psm(list.iter()))
                    .last();
                if let Some(psm) = found {
                    debug!("[SDP] HID Interrupt PSM: 0x{:04X}", psm);
                    self.interrupt_psm = Some(psm);
                }
                ParsedAttribute::AdditionalProtocolDescriptorLists(self.interrupt_psm)
            }
            ATTRIBUTE_HID_DESCRIPTOR_LIST => {
                let found = lists
                    .filter(|list| list.element_type() == DataElementType::Sequence)
                    .flat_map(|list| list.iter())
                    .filter_map(|entry| entry.string())
                    .last();
                if let Some(descriptor) = found {
                    // Always fits: the descriptor is a slice of the reassembly buffer
                    self.hid_descriptor.clear();
                    self.hid_descriptor.extend_from_slice(descriptor).ok();
                    debug!("[SDP] HID Descriptor: {:02X}", self.hid_descriptor.as_slice());
                }
                ParsedAttribute::HidDescriptorList(self.hid_descriptor.len())
            }
            other => ParsedAttribute::Other(other),
        }
    }
}

impl Default for SdpAttributeCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk a protocol descriptor list and return the PSM following the L2CAP UUID
///
/// Each protocol descriptor is a sequence whose first element is the protocol
/// UUID; for L2CAP the second element is the PSM. The last match wins.
fn l2cap_psm(descriptors: Sequence<'_>) -> Option<ProtocolServiceMultiplexer> {
    descriptors
        .filter(|descriptor| descriptor.element_type() == DataElementType::Sequence)
        .filter_map(|descriptor| {
            let mut parameters = descriptor.iter();
            let protocol = parameters.next()?.uuid32()?;
            if protocol != L2CAP_PROTOCOL_UUID {
                return None;
            }
            parameters.next()?.uint16()
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// DES { DES { UUID16 L2CAP, UINT16 0x0011 }, DES { UUID16 HIDP } }
    const PROTOCOL_DESCRIPTOR_LIST: [u8; 15] = [
        0x35, 0x0D, 0x35, 0x06, 0x19, 0x01, 0x00, 0x09, 0x00, 0x11, 0x35, 0x03, 0x19, 0x00, 0x11,
    ];

    /// DES { DES { DES { UUID16 L2CAP, UINT16 0x0013 }, DES { UUID16 HIDP } } }
    const ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS: [u8; 17] = [
        0x35, 0x0F, 0x35, 0x0D, 0x35, 0x06, 0x19, 0x01, 0x00, 0x09, 0x00, 0x13, 0x35, 0x03, 0x19,
        0x00, 0x11,
    ];

    /// DES { DES { UINT8 0x22, STRING [05 01 09 06] } }
    const HID_DESCRIPTOR_LIST: [u8; 12] = [
        0x35, 0x0A, 0x35, 0x08, 0x08, 0x22, 0x25, 0x04, 0x05, 0x01, 0x09, 0x06,
    ];

    fn feed_attribute(
        collector: &mut SdpAttributeCollector,
        attribute_id: u16,
        value: &[u8],
    ) -> Vec<ParsedAttribute, 4> {
        let mut parsed = Vec::new();
        for (offset, &data) in value.iter().enumerate() {
            let byte = AttributeByte {
                attribute_id,
                attribute_length: value.len() as u16,
                offset: offset as u16,
                data,
            };
            if let Some(attribute) = collector.feed(&byte).unwrap() {
                parsed.push(attribute).unwrap();
            }
        }
        parsed
    }

    #[test]
    fn test_protocol_descriptor_list_yields_control_psm() {
        let mut collector = SdpAttributeCollector::new();
        let parsed = feed_attribute(
            &mut collector,
            ATTRIBUTE_PROTOCOL_DESCRIPTOR_LIST,
            &PROTOCOL_DESCRIPTOR_LIST,
        );
        assert_eq!(
            parsed.as_slice(),
            &[ParsedAttribute::ProtocolDescriptorList(Some(0x0011))]
        );
        assert_eq!(collector.control_psm(), Some(0x0011));
        assert_eq!(collector.interrupt_psm(), None);
    }

    #[test]
    fn test_additional_lists_yield_interrupt_psm() {
        let mut collector = SdpAttributeCollector::new();
        let parsed = feed_attribute(
            &mut collector,
            ATTRIBUTE_ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS,
            &ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS,
        );
        assert_eq!(
            parsed.as_slice(),
            &[ParsedAttribute::AdditionalProtocolDescriptorLists(Some(
                0x0013
            ))]
        );
        assert_eq!(collector.interrupt_psm(), Some(0x0013));
    }

    #[test]
    fn test_hid_descriptor_list_is_stored() {
        let mut collector = SdpAttributeCollector::new();
        let parsed = feed_attribute(
            &mut collector,
            ATTRIBUTE_HID_DESCRIPTOR_LIST,
            &HID_DESCRIPTOR_LIST,
        );
        assert_eq!(parsed.as_slice(), &[ParsedAttribute::HidDescriptorList(4)]);
        assert_eq!(collector.hid_descriptor(), &[0x05, 0x01, 0x09, 0x06]);
    }

    #[test]
    fn test_unknown_attribute_is_not_interpreted() {
        let mut collector = SdpAttributeCollector::new();
        let parsed = feed_attribute(&mut collector, 0x0001, &[0x35, 0x03, 0x19, 0x11, 0x24]);
        assert_eq!(parsed.as_slice(), &[ParsedAttribute::Other(0x0001)]);
        assert_eq!(collector.complete(), Err(SdpError::MissingControlPsm));
    }

    #[test]
    fn test_out_of_order_bytes_never_parse() {
        let mut collector = SdpAttributeCollector::new();
        let length = PROTOCOL_DESCRIPTOR_LIST.len();
        // Final byte never arrives, so offset + 1 never reaches length
        let mut parses = 0;
        for offset in (0..length - 1).rev() {
            let byte = AttributeByte {
                attribute_id: ATTRIBUTE_PROTOCOL_DESCRIPTOR_LIST,
                attribute_length: length as u16,
                offset: offset as u16,
                data: PROTOCOL_DESCRIPTOR_LIST[offset],
            };
            if collector.feed(&byte).unwrap().is_some() {
                parses += 1;
            }
        }
        assert_eq!(parses, 0);
        assert_eq!(collector.control_psm(), None);
    }

    #[test]
    fn test_oversized_attribute_is_dropped() {
        let mut collector = SdpAttributeCollector::new();
        let byte = AttributeByte {
            attribute_id: ATTRIBUTE_HID_DESCRIPTOR_LIST,
            attribute_length: MAX_ATTRIBUTE_VALUE_SIZE as u16 + 1,
            offset: 0,
            data: 0xAB,
        };
        assert_eq!(
            collector.feed(&byte),
            Err(SdpError::AttributeTooLarge {
                required: 301,
                available: 300
            })
        );
        assert!(collector.buffer.iter().all(|&b| b == 0));

        let last = AttributeByte {
            offset: MAX_ATTRIBUTE_VALUE_SIZE as u16,
            ..byte
        };
        assert!(collector.feed(&last).is_err());
    }

    #[test]
    fn test_offset_past_length_is_dropped() {
        let mut collector = SdpAttributeCollector::new();
        let byte = AttributeByte {
            attribute_id: ATTRIBUTE_PROTOCOL_DESCRIPTOR_LIST,
            attribute_length: 4,
            offset: 4,
            data: 0xAB,
        };
        assert_eq!(collector.feed(&byte), Err(SdpError::OffsetOutOfRange));
        assert!(collector.buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_attribute_at_full_capacity_is_accepted() {
        let mut collector = SdpAttributeCollector::new();
        let byte = AttributeByte {
            attribute_id: 0x0100,
            attribute_length: MAX_ATTRIBUTE_VALUE_SIZE as u16,
            offset: MAX_ATTRIBUTE_VALUE_SIZE as u16 - 1,
            data: 0xAB,
        };
        assert_eq!(
            collector.feed(&byte),
            Ok(Some(ParsedAttribute::Other(0x0100)))
        );
    }

    #[test]
    fn test_malformed_lists_are_skipped() {
        let mut collector = SdpAttributeCollector::new();
        // First descriptor uses a UINT instead of a UUID, second is truncated
        let value = [
            0x35, 0x0A, 0x35, 0x04, 0x08, 0x01, 0x08, 0x11, 0x35, 0x06, 0x19, 0x01,
        ];
        let parsed = feed_attribute(&mut collector, ATTRIBUTE_PROTOCOL_DESCRIPTOR_LIST, &value);
        assert_eq!(
            parsed.as_slice(),
            &[ParsedAttribute::ProtocolDescriptorList(None)]
        );
    }

    #[test]
    fn test_non_l2cap_protocol_is_ignored() {
        let mut collector = SdpAttributeCollector::new();
        // DES { DES { UUID16 RFCOMM, UINT8 3 } }
        let value = [0x35, 0x07, 0x35, 0x05, 0x19, 0x00, 0x03, 0x08, 0x03];
        feed_attribute(&mut collector, ATTRIBUTE_PROTOCOL_DESCRIPTOR_LIST, &value);
        assert_eq!(collector.control_psm(), None);
    }

    #[test]
    fn test_complete_requires_both_psms() {
        let mut collector = SdpAttributeCollector::new();
        assert_eq!(collector.complete(), Err(SdpError::MissingControlPsm));

        feed_attribute(
            &mut collector,
            ATTRIBUTE_PROTOCOL_DESCRIPTOR_LIST,
            &PROTOCOL_DESCRIPTOR_LIST,
        );
        assert_eq!(collector.complete(), Err(SdpError::MissingInterruptPsm));

        feed_attribute(
            &mut collector,
            ATTRIBUTE_ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS,
            &ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS,
        );
        assert_eq!(
            collector.complete(),
            Ok(ServicePsms {
                control: 0x0011,
                interrupt: 0x0013
            })
        );

        collector.reset();
        assert_eq!(collector.complete(), Err(SdpError::MissingControlPsm));
        assert!(collector.hid_descriptor().is_empty());
    }
}
