//! L2CAP (Logical Link Control and Adaptation Protocol) types
//!
//! The Bluetooth stack owns channel signaling; this crate only needs the
//! channel and PSM vocabulary and basic frame parsing for incoming data.

pub mod packet;

pub use packet::{ChannelId, L2capError, L2capHeader, L2capPacket, ProtocolServiceMultiplexer};
