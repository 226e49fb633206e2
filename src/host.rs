//! HID host connection orchestration
//!
//! [`HidHost`] owns every piece of connection state and reacts to
//! [`StackEvent`]s one at a time:
//!
//! ```text
//! PoweredOff -> Discovering -> ControlOpening -> InterruptOpening -> Connected
//!                    ^                                                   |
//!                    +------------------- Disconnected <-----------------+
//! ```
//!
//! 1. Once the stack is working, an SDP query for the HID service class is
//!    sent to the configured keypad.
//! 2. When the query completes with both PSMs, the HID Control channel is
//!    opened, then the HID Interrupt channel once control is up.
//! 3. Reports arriving on the interrupt channel are turned into IR frames.
//!
//! Failures are logged and leave the state untouched. Recovery only happens
//! when the stack reports a new connection or a disconnect.

use crate::{
    BluetoothAddress, BluetoothError,
    constants::{
        DEFAULT_PIN_CODE, DEFAULT_REMOTE_ADDR, HID_L2CAP_MTU, HID_SERVICE_CLASS_UUID,
        MAX_L2CAP_PAYLOAD, MAX_PIN_CODE_LENGTH,
    },
    event::{StackEvent, StackState},
    ir::IrTransmitter,
    l2cap::{ChannelId, ProtocolServiceMultiplexer, packet::cid},
    report::{self, ReportOutcome},
    sdp::{AttributeByte, SdpAttributeCollector, SdpError},
};

/// Bluetooth stack collaborator
///
/// The stack runs HCI, L2CAP signaling and SDP itself; the HID host only
/// issues the requests below and receives the results as [`StackEvent`]s.
/// A non-zero status from the stack is reported as
/// [`BluetoothError::HciError`].
///
/// Secure Simple Pairing numeric comparison is never answered by the HID
/// host. Implementors must configure their stack to auto-accept
/// confirmation requests (`NoInputNoOutput` IO capability), otherwise
/// pairing with SSP keypads stalls.
pub trait BluetoothStack {
    /// Turn the radio on
    ///
    /// # Errors
    /// Returns an error if the stack refuses the request
    fn power_on(&mut self) -> Result<(), BluetoothError>;

    /// Set the link policy applied to new connections
    ///
    /// # Errors
    /// Returns an error if the stack refuses the request
    fn set_default_link_policy(&mut self, policy: LinkPolicy) -> Result<(), BluetoothError>;

    /// Start an SDP service search attribute query for a 16-bit service UUID
    ///
    /// Results arrive as [`StackEvent::SdpAttributeByte`] followed by
    /// [`StackEvent::SdpQueryComplete`].
    ///
    /// # Errors
    /// Returns an error if the query could not be started
    fn sdp_query_uuid16(
        &mut self,
        remote: BluetoothAddress,
        uuid: u16,
    ) -> Result<(), BluetoothError>;

    /// Start opening an L2CAP channel and return its local CID
    ///
    /// Completion is reported by [`StackEvent::ChannelOpened`].
    ///
    /// # Errors
    /// Returns an error if the request could not be sent
    fn l2cap_create_channel(
        &mut self,
        remote: BluetoothAddress,
        psm: ProtocolServiceMultiplexer,
        mtu: u16,
    ) -> Result<ChannelId, BluetoothError>;

    /// Answer a legacy pairing PIN code request
    ///
    /// # Errors
    /// Returns an error if the reply could not be sent
    fn pin_code_response(
        &mut self,
        remote: BluetoothAddress,
        pin: &str,
    ) -> Result<(), BluetoothError>;
}

/// HCI default link policy settings bit field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkPolicy(u16);

impl LinkPolicy {
    /// Allow sniff mode, requested by HID devices to save power
    pub const ENABLE_SNIFF_MODE: Self = Self(0x0004);

    /// Raw settings bits
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

/// `HidHost` configuration options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidHostOptions {
    /// Address of the keypad, `XX-XX-XX-XX-XX-XX` or `XX:XX:XX:XX:XX:XX`
    pub remote_addr: &'static str,
    /// PIN used for legacy pairing
    pub pin_code: &'static str,
    /// MTU requested for both HID channels, at most
    /// [`MAX_L2CAP_PAYLOAD`](crate::constants::MAX_L2CAP_PAYLOAD)
    pub l2cap_mtu: u16,
    /// Default link policy applied before power on
    pub link_policy: LinkPolicy,
}

impl Default for HidHostOptions {
    fn default() -> Self {
        Self {
            remote_addr: DEFAULT_REMOTE_ADDR,
            pin_code: DEFAULT_PIN_CODE,
            l2cap_mtu: HID_L2CAP_MTU,
            link_policy: LinkPolicy::ENABLE_SNIFF_MODE,
        }
    }
}

/// Connection progress of the HID host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidHostState {
    /// Radio not started yet
    #[default]
    PoweredOff,
    /// SDP query in progress, or stalled after an incomplete one
    Discovering,
    /// Waiting for the HID Control channel
    ControlOpening,
    /// Waiting for the HID Interrupt channel
    InterruptOpening,
    /// Both channels open, reports are processed
    Connected,
    /// Baseband link dropped
    Disconnected,
}

/// PSMs and channel identifiers of the HID connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidEndpoints {
    /// HID Control PSM from SDP
    pub control_psm: Option<ProtocolServiceMultiplexer>,
    /// HID Interrupt PSM from SDP
    pub interrupt_psm: Option<ProtocolServiceMultiplexer>,
    /// Local CID of the control channel
    pub control_cid: Option<ChannelId>,
    /// Local CID of the interrupt channel
    pub interrupt_cid: Option<ChannelId>,
}

/// Bluetooth HID host bridging one keypad to an IR transmitter
#[derive(Debug)]
pub struct HidHost<S, I> {
    stack: S,
    ir: I,
    options: HidHostOptions,
    remote: BluetoothAddress,
    state: HidHostState,
    device_connected: bool,
    query_in_flight: bool,
    collector: SdpAttributeCollector,
    endpoints: HidEndpoints,
}

impl<S: BluetoothStack, I: IrTransmitter> HidHost<S, I> {
    /// Create a host for the keypad named in `options`
    ///
    /// # Errors
    /// Returns `BluetoothError::InvalidParameter` if the address does not
    /// parse, the PIN is empty or longer than 16 characters, or the MTU is
    /// zero or larger than an event payload can hold
    pub fn new(options: HidHostOptions, stack: S, ir: I) -> Result<Self, BluetoothError> {
        let remote = BluetoothAddress::from_hex(options.remote_addr)?;
        if options.pin_code.is_empty() || options.pin_code.len() > MAX_PIN_CODE_LENGTH {
            return Err(BluetoothError::InvalidParameter);
        }
        if options.l2cap_mtu == 0 || usize::from(options.l2cap_mtu) > MAX_L2CAP_PAYLOAD {
            return Err(BluetoothError::InvalidParameter);
        }

        Ok(Self {
            stack,
            ir,
            options,
            remote,
            state: HidHostState::PoweredOff,
            device_connected: false,
            query_in_flight: false,
            collector: SdpAttributeCollector::new(),
            endpoints: HidEndpoints::default(),
        })
    }

    /// Apply the link policy and power the radio on
    ///
    /// Discovery starts once the stack reports [`StackState::Working`].
    ///
    /// # Errors
    /// Returns the stack error if either request is refused
    pub fn start(&mut self) -> Result<(), BluetoothError> {
        info!("[HOST] Starting HID host for {}", self.remote.format_hex().as_str());
        self.stack.set_default_link_policy(self.options.link_policy)?;
        self.stack.power_on()
    }

    /// Handle one stack event to completion
    ///
    /// Errors are logged here and never returned.
    pub fn handle_event(&mut self, event: &StackEvent) {
        debug!("[HOST] Event: {}", event.name());

        let result = match *event {
            StackEvent::StackState(state) => self.on_stack_state(state),
            StackEvent::ConnectionComplete { addr, success } => {
                debug!(
                    "[HOST] Connection complete with {} (success: {})",
                    addr.format_hex().as_str(),
                    success
                );
                if self.device_connected {
                    Ok(())
                } else {
                    self.begin_discovery()
                }
            }
            StackEvent::ConnectionCountChanged(count) => self.on_connection_count(count),
            StackEvent::PinCodeRequest(addr) => {
                info!("[HOST] Pin code request - using '{}'", self.options.pin_code);
                self.stack.pin_code_response(addr, self.options.pin_code)
            }
            StackEvent::UserConfirmationRequest { addr, numeric_value } => {
                info!(
                    "[HOST] SSP User Confirmation Auto accept {} from {}",
                    numeric_value,
                    addr.format_hex().as_str()
                );
                Ok(())
            }
            StackEvent::ChannelOpened { status, cid, psm } => {
                self.on_channel_opened(status, cid, psm)
            }
            StackEvent::SdpAttributeByte(ref byte) => self.on_attribute_byte(byte),
            StackEvent::SdpQueryComplete { status } => self.on_query_complete(status),
            StackEvent::L2capData { cid, ref payload } => {
                self.handle_l2cap_data(cid, payload);
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("[HOST] {} failed: {:?}", event.name(), e);
        }
    }

    /// Route an L2CAP data packet
    ///
    /// Interrupt channel data is processed as a HID report; control channel
    /// data is only logged. Returns the report outcome when one was processed.
    pub fn handle_l2cap_data(&mut self, cid: ChannelId, payload: &[u8]) -> Option<ReportOutcome> {
        debug!("[HOST] L2CAP data on 0x{:04X}: {:02X}", cid, payload);

        if Some(cid) == self.endpoints.interrupt_cid {
            Some(report::process_report(payload, &mut self.ir))
        } else {
            if Some(cid) == self.endpoints.control_cid {
                debug!("[HOST] HID Control data ({} bytes)", payload.len());
            } else {
                trace!("[HOST] Ignoring data on unknown channel 0x{:04X}", cid);
            }
            None
        }
    }

    /// Current connection progress
    #[must_use]
    pub const fn state(&self) -> HidHostState {
        self.state
    }

    /// Whether the stack reports at least one baseband connection
    #[must_use]
    pub const fn is_device_connected(&self) -> bool {
        self.device_connected
    }

    /// PSMs and CIDs known so far
    #[must_use]
    pub const fn endpoints(&self) -> &HidEndpoints {
        &self.endpoints
    }

    /// HID report descriptor from the last SDP query
    #[must_use]
    pub fn hid_descriptor(&self) -> &[u8] {
        self.collector.hid_descriptor()
    }

    /// Address of the keypad
    #[must_use]
    pub const fn remote(&self) -> BluetoothAddress {
        self.remote
    }

    /// The Bluetooth stack collaborator
    #[must_use]
    pub const fn stack(&self) -> &S {
        &self.stack
    }

    /// The IR transmitter collaborator
    #[must_use]
    pub const fn ir(&self) -> &I {
        &self.ir
    }

    fn on_stack_state(&mut self, state: StackState) -> Result<(), BluetoothError> {
        debug!("[HOST] Stack state {:?}", state);
        match state {
            StackState::Working => self.begin_discovery(),
            _ => Ok(()),
        }
    }

    fn on_connection_count(&mut self, count: u8) -> Result<(), BluetoothError> {
        if count > 0 {
            info!("[HOST] Device connected");
            self.device_connected = true;
            Ok(())
        } else {
            info!("[HOST] Device disconnected");
            self.device_connected = false;
            self.state = HidHostState::Disconnected;
            self.begin_discovery()
        }
    }

    fn begin_discovery(&mut self) -> Result<(), BluetoothError> {
        if !self.query_in_flight {
            self.collector.reset();
            self.endpoints = HidEndpoints::default();
        }

        info!("[HOST] Start SDP HID query");
        self.stack
            .sdp_query_uuid16(self.remote, HID_SERVICE_CLASS_UUID)?;
        self.query_in_flight = true;
        self.state = HidHostState::Discovering;
        Ok(())
    }

    fn on_attribute_byte(&mut self, byte: &AttributeByte) -> Result<(), BluetoothError> {
        if let Some(parsed) = self.collector.feed(byte)? {
            debug!("[HOST] Parsed {:?}", parsed);
        }
        Ok(())
    }

    fn on_query_complete(&mut self, status: u8) -> Result<(), BluetoothError> {
        self.query_in_flight = false;
        if status != 0 {
            warn!("[HOST] SDP query completed with status 0x{:02X}", status);
        }

        let psms = self.collector.complete()?;
        debug!(
            "[HOST] HID Control PSM: 0x{:04X}, HID Interrupt PSM: 0x{:04X}",
            psms.control,
            psms.interrupt
        );
        debug!(
            "[HOST] HID Descriptor: {:02X}",
            self.collector.hid_descriptor()
        );
        self.endpoints.control_psm = Some(psms.control);
        self.endpoints.interrupt_psm = Some(psms.interrupt);

        let cid = self
            .stack
            .l2cap_create_channel(self.remote, psms.control, self.options.l2cap_mtu)?;
        debug!("[HOST] Opening HID Control on 0x{:04X}", cid);
        self.endpoints.control_cid = Some(cid);
        self.state = HidHostState::ControlOpening;
        Ok(())
    }

    fn on_channel_opened(
        &mut self,
        status: u8,
        cid: ChannelId,
        psm: ProtocolServiceMultiplexer,
    ) -> Result<(), BluetoothError> {
        if status != 0 {
            return Err(BluetoothError::ChannelOpenFailed(status));
        }
        if cid == cid::NULL {
            return Err(BluetoothError::UnexpectedChannel(cid));
        }

        if Some(cid) == self.endpoints.control_cid {
            info!("[HOST] HID Control connected (PSM 0x{:04X})", psm);
            let interrupt_psm = self
                .endpoints
                .interrupt_psm
                .ok_or(SdpError::MissingInterruptPsm)?;
            let interrupt_cid = self.stack.l2cap_create_channel(
                self.remote,
                interrupt_psm,
                self.options.l2cap_mtu,
            )?;
            self.endpoints.interrupt_cid = Some(interrupt_cid);
            self.state = HidHostState::InterruptOpening;
            Ok(())
        } else if Some(cid) == self.endpoints.interrupt_cid {
            info!("[HOST] HID Connection established");
            self.state = HidHostState::Connected;
            Ok(())
        } else {
            Err(BluetoothError::UnexpectedChannel(cid))
        }
    }
}
