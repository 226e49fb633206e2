//! Events delivered by the Bluetooth stack
//!
//! Every callback the stack makes is decoded once, at the boundary, into a
//! [`StackEvent`]. The HID host then dispatches on the variant.

use crate::{
    BluetoothAddress,
    constants::MAX_L2CAP_PAYLOAD,
    l2cap::{ChannelId, L2capError, L2capPacket, ProtocolServiceMultiplexer},
    sdp::AttributeByte,
};
use bt_hci::event;
use heapless::Vec;

/// Payload of an L2CAP data packet, bounded by the requested MTU
pub type Payload = Vec<u8, MAX_L2CAP_PAYLOAD>;

/// Lifecycle state reported by the Bluetooth stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackState {
    /// Radio is off
    Off,
    /// Controller is being initialized
    Initializing,
    /// Stack is up and ready for commands
    Working,
    /// Stack is shutting down
    Halting,
    /// Controller is asleep
    Sleeping,
}

/// Event delivered by the Bluetooth stack
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackEvent {
    /// Stack lifecycle changed
    StackState(StackState),
    /// Baseband (ACL) connection setup finished
    ConnectionComplete {
        /// Remote device
        addr: BluetoothAddress,
        /// Whether the connection was established
        success: bool,
    },
    /// Number of baseband connections changed
    ConnectionCountChanged(u8),
    /// Remote requested a legacy pairing PIN
    PinCodeRequest(BluetoothAddress),
    /// Secure Simple Pairing numeric comparison
    UserConfirmationRequest {
        /// Remote device
        addr: BluetoothAddress,
        /// Six digit value to compare
        numeric_value: u32,
    },
    /// An L2CAP channel finished opening
    ChannelOpened {
        /// Zero on success, stack error code otherwise
        status: u8,
        /// Local channel identifier
        cid: ChannelId,
        /// PSM the channel was opened for
        psm: ProtocolServiceMultiplexer,
    },
    /// One attribute value byte from an SDP query
    SdpAttributeByte(AttributeByte),
    /// The SDP query finished
    SdpQueryComplete {
        /// Zero on success, stack error code otherwise
        status: u8,
    },
    /// Data received on an L2CAP channel
    L2capData {
        /// Local channel identifier
        cid: ChannelId,
        /// Received payload
        payload: Payload,
    },
}

impl StackEvent {
    /// Build a data event from a channel and payload
    ///
    /// # Errors
    /// Returns `L2capError::PayloadTooLarge` if the payload exceeds the MTU
    pub fn l2cap_data(cid: ChannelId, payload: &[u8]) -> Result<Self, L2capError> {
        Ok(Self::L2capData {
            cid,
            payload: Vec::from_slice(payload).map_err(|()| L2capError::PayloadTooLarge)?,
        })
    }

    /// Decode an L2CAP basic frame (header included) into a data event
    ///
    /// # Errors
    /// Returns `L2capError` if the frame is truncated or exceeds the MTU
    pub fn from_l2cap_frame(frame: &[u8]) -> Result<Self, L2capError> {
        let packet = L2capPacket::<MAX_L2CAP_PAYLOAD>::from_bytes(frame)?;
        Ok(Self::L2capData {
            cid: packet.channel_id(),
            payload: packet.payload,
        })
    }

    /// Convert the HCI events the HID host reacts to
    ///
    /// Returns `None` for every other event.
    #[must_use]
    pub fn from_hci(event: &event::Event<'_>) -> Option<Self> {
        match *event {
            event::Event::ConnectionComplete(ref complete) => Some(Self::ConnectionComplete {
                addr: complete.bd_addr.try_into().ok()?,
                success: complete.status.to_result().is_ok(),
            }),
            event::Event::PinCodeRequest(ref request) => {
                Some(Self::PinCodeRequest(request.bd_addr.try_into().ok()?))
            }
            event::Event::UserConfirmationRequest(ref request) => {
                Some(Self::UserConfirmationRequest {
                    addr: request.bd_addr.try_into().ok()?,
                    numeric_value: request.numeric_value,
                })
            }
            _ => None,
        }
    }

    /// Short event name for diagnostics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StackState(_) => "StackState",
            Self::ConnectionComplete { .. } => "ConnectionComplete",
            Self::ConnectionCountChanged(_) => "ConnectionCountChanged",
            Self::PinCodeRequest(_) => "PinCodeRequest",
            Self::UserConfirmationRequest { .. } => "UserConfirmationRequest",
            Self::ChannelOpened { .. } => "ChannelOpened",
            Self::SdpAttributeByte(_) => "SdpAttributeByte",
            Self::SdpQueryComplete { .. } => "SdpQueryComplete",
            Self::L2capData { .. } => "L2capData",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HID_L2CAP_MTU;
    use bt_hci::FromHciBytes;

    const REMOTE: [u8; 6] = [0x3D, 0x0E, 0x01, 0x16, 0x05, 0x2E];

    fn decode(packet: &[u8]) -> Option<StackEvent> {
        let (event, _) = event::Event::from_hci_bytes(packet).unwrap();
        StackEvent::from_hci(&event)
    }

    #[test]
    fn test_from_hci_connection_complete() {
        // status, handle, BD_ADDR, link type ACL, encryption off
        let mut packet = [0x03, 0x0B, 0x00, 0x40, 0x00, 0, 0, 0, 0, 0, 0, 0x01, 0x00];
        packet[5..11].copy_from_slice(&REMOTE);
        assert_eq!(
            decode(&packet),
            Some(StackEvent::ConnectionComplete {
                addr: BluetoothAddress::new(REMOTE),
                success: true,
            })
        );

        // Page timeout
        packet[2] = 0x04;
        assert_eq!(
            decode(&packet),
            Some(StackEvent::ConnectionComplete {
                addr: BluetoothAddress::new(REMOTE),
                success: false,
            })
        );
    }

    #[test]
    fn test_from_hci_pairing_requests() {
        let mut pin_request = [0x16, 0x06, 0, 0, 0, 0, 0, 0];
        pin_request[2..].copy_from_slice(&REMOTE);
        assert_eq!(
            decode(&pin_request),
            Some(StackEvent::PinCodeRequest(BluetoothAddress::new(REMOTE)))
        );

        let mut confirmation = [0x33, 0x0A, 0, 0, 0, 0, 0, 0, 0x40, 0xE2, 0x01, 0x00];
        confirmation[2..8].copy_from_slice(&REMOTE);
        assert_eq!(
            decode(&confirmation),
            Some(StackEvent::UserConfirmationRequest {
                addr: BluetoothAddress::new(REMOTE),
                numeric_value: 123_456,
            })
        );
    }

    #[test]
    fn test_from_hci_ignores_other_events() {
        // Disconnection Complete
        assert_eq!(decode(&[0x05, 0x04, 0x00, 0x40, 0x00, 0x13]), None);
    }

    #[test]
    fn test_l2cap_data_respects_mtu() {
        let report = [0xA1, 0x01, 0x00, 0x00, 0x59, 0x00, 0x00, 0x00, 0x00, 0x00];
        let event = StackEvent::l2cap_data(0x0041, &report).unwrap();
        assert_eq!(event.name(), "L2capData");
        let StackEvent::L2capData { cid, payload } = event else {
            panic!("Expected L2capData");
        };
        assert_eq!(cid, 0x0041);
        assert_eq!(payload.as_slice(), &report);

        let oversized = [0u8; HID_L2CAP_MTU as usize + 1];
        assert_eq!(
            StackEvent::l2cap_data(0x0041, &oversized),
            Err(L2capError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_from_l2cap_frame() {
        let frame = [0x03, 0x00, 0x40, 0x00, 0xA1, 0x01, 0x00];
        assert_eq!(
            StackEvent::from_l2cap_frame(&frame),
            StackEvent::l2cap_data(0x0040, &[0xA1, 0x01, 0x00])
        );
        assert_eq!(
            StackEvent::from_l2cap_frame(&frame[..5]),
            Err(L2capError::InsufficientData)
        );
    }
}
