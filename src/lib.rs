#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

#[macro_use]
mod fmt;

mod address;
pub mod api;
pub mod constants;
pub mod event;
mod host;
pub mod ir;
pub mod keypad;
pub mod l2cap;
pub mod processor;
pub mod report;
pub mod sdp;

#[cfg(test)]
mod testing;

use crate::{constants::EVENT_QUEUE_DEPTH, event::StackEvent, l2cap::L2capError, sdp::SdpError};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};

pub use address::BluetoothAddress;
pub use host::{BluetoothStack, HidEndpoints, HidHost, HidHostOptions, HidHostState, LinkPolicy};
pub use ir::{IrTransmitter, RemoteFunction};
pub use report::ReportOutcome;

/// Stack events waiting for the processor task
pub(crate) static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, StackEvent, EVENT_QUEUE_DEPTH> =
    Channel::new();

/// Run the one-time setup of the bridge and power the radio on
///
/// For runtimes that own their event loop and call
/// [`HidHost::handle_event`] themselves. Setup failures are logged; the
/// status code is always 0.
pub fn bridge_main<S: BluetoothStack, I: IrTransmitter>(host: &mut HidHost<S, I>) -> i32 {
    if let Err(e) = host.start() {
        error!("[HOST] Setup failed: {:?}", e);
    }
    0
}

/// Error types for Bluetooth operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BluetoothError {
    /// The stack refused a request with this status code
    HciError(u8),
    /// Malformed configuration value
    InvalidParameter,
    /// The event queue has no room
    QueueFull,
    /// An L2CAP channel failed to open with this status
    ChannelOpenFailed(u8),
    /// Event for a channel that is not part of the HID connection
    UnexpectedChannel(u16),
    /// Service discovery error
    Sdp(SdpError),
    /// Malformed L2CAP frame
    L2cap(L2capError),
}

impl core::fmt::Display for BluetoothError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::HciError(status) => write!(f, "HCI error 0x{status:02X}"),
            Self::InvalidParameter => write!(f, "Invalid parameter"),
            Self::QueueFull => write!(f, "Event queue full"),
            Self::ChannelOpenFailed(status) => {
                write!(f, "L2CAP channel open failed with status 0x{status:02X}")
            }
            Self::UnexpectedChannel(cid) => write!(f, "Unexpected channel 0x{cid:04X}"),
            Self::Sdp(e) => write!(f, "SDP error: {e}"),
            Self::L2cap(e) => write!(f, "L2CAP error: {e}"),
        }
    }
}

impl From<SdpError> for BluetoothError {
    fn from(e: SdpError) -> Self {
        Self::Sdp(e)
    }
}

impl From<L2capError> for BluetoothError {
    fn from(e: L2capError) -> Self {
        Self::L2cap(e)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::{MockStack, RecordingIr, StackCall};
    use std::string::ToString;

    #[test]
    fn test_bridge_main_returns_zero() {
        let mut host = HidHost::new(
            HidHostOptions::default(),
            MockStack::default(),
            RecordingIr::default(),
        )
        .unwrap();
        assert_eq!(bridge_main(&mut host), 0);
        assert_eq!(host.stack().calls.last(), Some(&StackCall::PowerOn));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(BluetoothError::HciError(0x0C).to_string(), "HCI error 0x0C");
        assert_eq!(
            BluetoothError::from(SdpError::MissingControlPsm).to_string(),
            "SDP error: HID Control PSM missing"
        );
    }
}
