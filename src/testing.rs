//! Host-side collaborators for unit tests

use crate::{
    BluetoothAddress, BluetoothError,
    constants::MAX_PIN_CODE_LENGTH,
    host::{BluetoothStack, LinkPolicy},
    ir::IrTransmitter,
    l2cap::{ChannelId, ProtocolServiceMultiplexer},
};
use heapless::{String, Vec};

/// Request made to [`MockStack`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackCall {
    PowerOn,
    LinkPolicy(LinkPolicy),
    SdpQuery(BluetoothAddress, u16),
    CreateChannel(BluetoothAddress, ProtocolServiceMultiplexer, u16),
    PinCodeResponse(BluetoothAddress, String<MAX_PIN_CODE_LENGTH>),
}

/// Records every request and hands out increasing dynamic CIDs
#[derive(Debug)]
pub struct MockStack {
    pub calls: Vec<StackCall, 32>,
    pub next_cid: ChannelId,
    pub fail_sdp_query: Option<u8>,
    pub fail_create_channel: Option<u8>,
}

impl Default for MockStack {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            next_cid: 0x0040,
            fail_sdp_query: None,
            fail_create_channel: None,
        }
    }
}

impl MockStack {
    fn record(&mut self, call: StackCall) {
        self.calls.push(call).expect("too many stack calls");
    }
}

impl BluetoothStack for MockStack {
    fn power_on(&mut self) -> Result<(), BluetoothError> {
        self.record(StackCall::PowerOn);
        Ok(())
    }

    fn set_default_link_policy(&mut self, policy: LinkPolicy) -> Result<(), BluetoothError> {
        self.record(StackCall::LinkPolicy(policy));
        Ok(())
    }

    fn sdp_query_uuid16(
        &mut self,
        remote: BluetoothAddress,
        uuid: u16,
    ) -> Result<(), BluetoothError> {
        if let Some(status) = self.fail_sdp_query {
            return Err(BluetoothError::HciError(status));
        }
        self.record(StackCall::SdpQuery(remote, uuid));
        Ok(())
    }

    fn l2cap_create_channel(
        &mut self,
        remote: BluetoothAddress,
        psm: ProtocolServiceMultiplexer,
        mtu: u16,
    ) -> Result<ChannelId, BluetoothError> {
        if let Some(status) = self.fail_create_channel {
            return Err(BluetoothError::HciError(status));
        }
        self.record(StackCall::CreateChannel(remote, psm, mtu));
        let cid = self.next_cid;
        self.next_cid += 1;
        Ok(cid)
    }

    fn pin_code_response(
        &mut self,
        remote: BluetoothAddress,
        pin: &str,
    ) -> Result<(), BluetoothError> {
        let pin = String::try_from(pin).map_err(|()| BluetoothError::InvalidParameter)?;
        self.record(StackCall::PinCodeResponse(remote, pin));
        Ok(())
    }
}

/// Records every NEC frame instead of driving an LED
#[derive(Debug, Default)]
pub struct RecordingIr {
    pub sent: Vec<(u32, u8), 64>,
}

impl IrTransmitter for RecordingIr {
    fn send_nec(&mut self, frame: u32, bits: u8) {
        self.sent.push((frame, bits)).expect("too many IR frames");
    }
}
