//! `TvPad` Constants
//!
//! Limits, default configuration values and the Bluetooth assigned numbers
//! used while discovering and talking to the remote keypad.

/// Remote keypad address used when no other is configured
pub const DEFAULT_REMOTE_ADDR: &str = "3D-0E-01-16-05-2E";

/// PIN code answered to every legacy pairing request
pub const DEFAULT_PIN_CODE: &str = "0000";

/// Maximum PIN code length in bytes
pub const MAX_PIN_CODE_LENGTH: usize = 16;

/// MTU requested when opening the HID control and interrupt channels
pub const HID_L2CAP_MTU: u16 = 48;

/// Capacity of the SDP attribute reassembly buffer and of the stored HID descriptor
pub const MAX_ATTRIBUTE_VALUE_SIZE: usize = 300;

/// Maximum L2CAP payload carried by a single stack event
///
/// Also the largest MTU `HidHost` accepts.
pub const MAX_L2CAP_PAYLOAD: usize = HID_L2CAP_MTU as usize;

/// Depth of the event queue between the Bluetooth stack and the processor
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Human Interface Device service class (16-bit UUID)
pub const HID_SERVICE_CLASS_UUID: u16 = 0x1124;

/// L2CAP protocol UUID as found in protocol descriptor lists
pub const L2CAP_PROTOCOL_UUID: u32 = 0x0100;

/// Protocol Descriptor List attribute
pub const ATTRIBUTE_PROTOCOL_DESCRIPTOR_LIST: u16 = 0x0004;

/// Additional Protocol Descriptor Lists attribute
pub const ATTRIBUTE_ADDITIONAL_PROTOCOL_DESCRIPTOR_LISTS: u16 = 0x000D;

/// HID Descriptor List attribute
pub const ATTRIBUTE_HID_DESCRIPTOR_LIST: u16 = 0x0206;

/// Length of the only interrupt report shape the keypad sends
pub const REPORT_LENGTH: usize = 10;

/// HIDP DATA/Input transaction header followed by report ID 1 and two padding bytes
pub const REPORT_HEADER: [u8; 4] = [0xA1, 0x01, 0x00, 0x00];

/// Number of key slots following the report header
pub const REPORT_KEY_SLOTS: usize = 6;

/// Key slot value the keypad uses to signal "too many keys pressed"
pub const ROLLOVER_ERROR_CODE: u8 = 0x01;
