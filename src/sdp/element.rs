//! SDP data element walking
//!
//! Zero-copy views over encoded data elements. A data element starts with a
//! one-byte descriptor: the upper five bits give the type, the lower three
//! the size index. Size indices 0-4 mean 1, 2, 4, 8 or 16 data bytes (none
//! for Nil); 5, 6 and 7 mean an 8, 16 or 32-bit big-endian length follows.

use super::SdpError;

/// Bluetooth Base UUID bytes following the leading 32 bits
const BASE_UUID_TAIL: [u8; 12] = [
    0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0x80, 0x5F, 0x9B, 0x34, 0xFB,
];

/// Data element type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataElementType {
    /// Nil (null value)
    Nil = 0,
    /// Unsigned integer
    UnsignedInt = 1,
    /// Signed integer
    SignedInt = 2,
    /// UUID
    Uuid = 3,
    /// Text string
    TextString = 4,
    /// Boolean
    Boolean = 5,
    /// Data element sequence
    Sequence = 6,
    /// Data element alternative
    Alternative = 7,
    /// URL
    Url = 8,
}

impl DataElementType {
    /// Decode the type bits of a descriptor byte
    #[must_use]
    pub const fn from_descriptor(descriptor: u8) -> Option<Self> {
        match descriptor >> 3 {
            0 => Some(Self::Nil),
            1 => Some(Self::UnsignedInt),
            2 => Some(Self::SignedInt),
            3 => Some(Self::Uuid),
            4 => Some(Self::TextString),
            5 => Some(Self::Boolean),
            6 => Some(Self::Sequence),
            7 => Some(Self::Alternative),
            8 => Some(Self::Url),
            _ => None,
        }
    }
}

/// A single encoded data element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataElement<'a> {
    element_type: DataElementType,
    data: &'a [u8],
    encoded_len: usize,
}

impl<'a> DataElement<'a> {
    /// Parse the data element at the start of `bytes`
    ///
    /// Trailing bytes after the element are ignored.
    ///
    /// # Errors
    /// Returns `SdpError::InvalidData` for reserved types or truncated elements
    pub fn parse(bytes: &'a [u8]) -> Result<Self, SdpError> {
        let (&descriptor, rest) = bytes.split_first().ok_or(SdpError::InvalidData)?;
        let element_type =
            DataElementType::from_descriptor(descriptor).ok_or(SdpError::InvalidData)?;

        let (length_size, data_size): (usize, usize) = match descriptor & 0x07 {
            _ if element_type == DataElementType::Nil => (0, 0),
            index @ 0..=4 => (0, 1usize << index),
            5 => (1, usize::from(*rest.first().ok_or(SdpError::InvalidData)?)),
            6 => {
                let length = rest.get(..2).ok_or(SdpError::InvalidData)?;
                (2, usize::from(u16::from_be_bytes([length[0], length[1]])))
            }
            _ => {
                let length = rest.get(..4).ok_or(SdpError::InvalidData)?;
                let length = u32::from_be_bytes([length[0], length[1], length[2], length[3]]);
                (4, usize::try_from(length).map_err(|_| SdpError::InvalidData)?)
            }
        };

        let end = length_size
            .checked_add(data_size)
            .ok_or(SdpError::InvalidData)?;
        let data = rest.get(length_size..end).ok_or(SdpError::InvalidData)?;

        Ok(Self {
            element_type,
            data,
            encoded_len: 1 + length_size + data_size,
        })
    }

    /// Element type
    #[must_use]
    pub const fn element_type(&self) -> DataElementType {
        self.element_type
    }

    /// Element payload without descriptor and length bytes
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Total encoded size including the descriptor
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// Iterate the children of a sequence or alternative
    ///
    /// Any other element type yields an empty iterator.
    #[must_use]
    pub fn iter(&self) -> Sequence<'a> {
        match self.element_type {
            DataElementType::Sequence | DataElementType::Alternative => Sequence::new(self.data),
            _ => Sequence::new(&[]),
        }
    }

    /// UUID value shortened to 32 bits
    ///
    /// 128-bit UUIDs only shorten when they are derived from the Bluetooth
    /// Base UUID.
    #[must_use]
    pub fn uuid32(&self) -> Option<u32> {
        if self.element_type != DataElementType::Uuid {
            return None;
        }
        match *self.data {
            [a, b] => Some(u32::from(u16::from_be_bytes([a, b]))),
            [a, b, c, d] => Some(u32::from_be_bytes([a, b, c, d])),
            [a, b, c, d, ref tail @ ..] if tail == BASE_UUID_TAIL => {
                Some(u32::from_be_bytes([a, b, c, d]))
            }
            _ => None,
        }
    }

    /// 8 or 16-bit unsigned integer value
    #[must_use]
    pub fn uint16(&self) -> Option<u16> {
        if self.element_type != DataElementType::UnsignedInt {
            return None;
        }
        match *self.data {
            [value] => Some(u16::from(value)),
            [hi, lo] => Some(u16::from_be_bytes([hi, lo])),
            _ => None,
        }
    }

    /// Raw bytes of a text string element
    #[must_use]
    pub fn string(&self) -> Option<&'a [u8]> {
        (self.element_type == DataElementType::TextString).then_some(self.data)
    }
}

/// Iterator over the children of a data element sequence
///
/// Iteration stops at the first malformed child.
#[derive(Debug, Clone)]
pub struct Sequence<'a> {
    remaining: &'a [u8],
}

impl<'a> Sequence<'a> {
    /// Iterate the elements encoded back to back in `bytes`
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { remaining: bytes }
    }
}

impl<'a> Iterator for Sequence<'a> {
    type Item = DataElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        match DataElement::parse(self.remaining) {
            Ok(element) => {
                self.remaining = &self.remaining[element.encoded_len()..];
                Some(element)
            }
            Err(_) => {
                trace!("[SDP] Skipping malformed data element");
                self.remaining = &[];
                None
            }
        }
    }
}
