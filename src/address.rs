use crate::BluetoothError;

/// A Bluetooth Device Address (`BD_ADDR`) wrapper for type safety
///
/// Bytes are stored in the order they are written in text form, so
/// `3D-0E-01-16-05-2E` becomes `[0x3D, 0x0E, 0x01, 0x16, 0x05, 0x2E]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BluetoothAddress(pub [u8; 6]);

impl BluetoothAddress {
    /// Create a new Bluetooth address from bytes
    #[must_use]
    pub const fn new(addr: [u8; 6]) -> Self {
        Self(addr)
    }

    /// Get the raw address bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Format the address as a colon-separated hex string
    #[must_use]
    pub fn format_hex(&self) -> heapless::String<17> {
        const HEX_CHARS: [char; 16] = [
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F',
        ];

        let mut result = heapless::String::new();
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                result.push(':').ok();
            }
            result.push(HEX_CHARS[(byte >> 4) as usize]).ok();
            result.push(HEX_CHARS[(byte & 0x0F) as usize]).ok();
        }
        result
    }

    /// Parse a human readable Bluetooth address
    ///
    /// Accepts six hex pairs separated by `:` or `-`, e.g. `3D-0E-01-16-05-2E`
    /// or `3d:0e:01:16:05:2e`. Separators may not be mixed.
    ///
    /// # Errors
    /// Returns `BluetoothError::InvalidParameter` if the string is not exactly
    /// 17 characters long, mixes separators, or contains non-hex digits
    pub fn from_hex(hex: &str) -> Result<Self, BluetoothError> {
        if hex.len() != 17 {
            return Err(BluetoothError::InvalidParameter);
        }

        let separator = match hex.as_bytes()[2] {
            b':' => ':',
            b'-' => '-',
            _ => return Err(BluetoothError::InvalidParameter),
        };

        let mut bytes = [0u8; 6];
        let mut count = 0;
        for pair in hex.split(separator) {
            if count >= 6 || pair.len() != 2 || !pair.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(BluetoothError::InvalidParameter);
            }
            bytes[count] =
                u8::from_str_radix(pair, 16).map_err(|_| BluetoothError::InvalidParameter)?;
            count += 1;
        }

        if count != 6 {
            return Err(BluetoothError::InvalidParameter);
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; 6]> for BluetoothAddress {
    fn from(addr: [u8; 6]) -> Self {
        Self(addr)
    }
}

impl From<BluetoothAddress> for [u8; 6] {
    fn from(addr: BluetoothAddress) -> Self {
        addr.0
    }
}

impl From<BluetoothAddress> for bt_hci::param::BdAddr {
    fn from(addr: BluetoothAddress) -> Self {
        bt_hci::param::BdAddr::new(addr.0)
    }
}

impl TryFrom<&str> for BluetoothAddress {
    type Error = BluetoothError;

    fn try_from(hex: &str) -> Result<Self, Self::Error> {
        BluetoothAddress::from_hex(hex)
    }
}

impl TryFrom<&[u8]> for BluetoothAddress {
    type Error = BluetoothError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() == 6 {
            let mut addr = [0u8; 6];
            addr.copy_from_slice(bytes);
            Ok(BluetoothAddress(addr))
        } else {
            Err(BluetoothError::InvalidParameter)
        }
    }
}

impl TryFrom<bt_hci::param::BdAddr> for BluetoothAddress {
    type Error = BluetoothError;

    fn try_from(bd_addr: bt_hci::param::BdAddr) -> Result<Self, Self::Error> {
        bd_addr.raw().try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_REMOTE_ADDR;

    #[test]
    fn test_parse_default_remote_address() {
        let addr = BluetoothAddress::from_hex(DEFAULT_REMOTE_ADDR).unwrap();
        assert_eq!(addr.as_bytes(), &[0x3D, 0x0E, 0x01, 0x16, 0x05, 0x2E]);
        assert_eq!(addr.format_hex().as_str(), "3D:0E:01:16:05:2E");
    }

    #[test]
    fn test_parse_colon_and_lowercase() {
        let addr = BluetoothAddress::from_hex("0a:b1:2c:d3:4e:f5").unwrap();
        assert_eq!(addr.as_bytes(), &[0x0A, 0xB1, 0x2C, 0xD3, 0x4E, 0xF5]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(BluetoothAddress::from_hex("3D-0E-01-16-05").is_err());
        assert!(BluetoothAddress::from_hex("3D-0E-01-16-05-2E-").is_err());
        assert!(BluetoothAddress::from_hex("3D:0E-01:16-05:2E").is_err());
        assert!(BluetoothAddress::from_hex("3D-0E-01-16-05-ZZ").is_err());
        assert!(BluetoothAddress::from_hex("3D 0E 01 16 05 2E").is_err());
        assert!(BluetoothAddress::from_hex("+3-0E-01-16-05-2E").is_err());
    }

    #[test]
    fn test_bluetooth_address_conversions() {
        let bytes = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];

        let addr: BluetoothAddress = bytes.into();
        assert_eq!(addr.as_bytes(), &bytes);

        let converted_bytes: [u8; 6] = addr.into();
        assert_eq!(converted_bytes, bytes);

        let bd_addr: bt_hci::param::BdAddr = addr.into();
        assert_eq!(bd_addr.raw(), bytes);
        assert_eq!(BluetoothAddress::try_from(bd_addr).unwrap(), addr);

        let addr_from_str: BluetoothAddress = "12-34-56-78-9A-BC".try_into().unwrap();
        assert_eq!(addr_from_str, addr);
    }

    #[test]
    fn test_bluetooth_address_try_from_slice() {
        let bytes = &[0x12u8, 0x34, 0x56, 0x78, 0x9A, 0xBC][..];
        let addr = BluetoothAddress::try_from(bytes).unwrap();
        assert_eq!(addr.as_bytes(), &[0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC]);

        assert!(BluetoothAddress::try_from(&[0x12u8, 0x34, 0x56][..]).is_err());
        assert!(BluetoothAddress::try_from(&[0u8; 8][..]).is_err());
    }
}
