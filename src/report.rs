//! HID interrupt report processing
//!
//! The keypad only ever sends one report shape on the interrupt channel:
//!
//! ```text
//! A1 01 00 00 K1 K2 K3 K4 K5 K6
//! ```
//!
//! `A1` is the HIDP DATA/Input header, `01` the report ID, followed by two
//! padding bytes and six key slots. All slots zero means every key was
//! released; all slots `01` is the keyboard's rollover error. The report
//! descriptor is not walked, this layout is hardcoded.

use crate::{
    constants::{
        MAX_L2CAP_PAYLOAD, REPORT_HEADER, REPORT_KEY_SLOTS, REPORT_LENGTH, ROLLOVER_ERROR_CODE,
    },
    ir::{self, IrTransmitter, RemoteFunction},
    keypad,
};
use heapless::Vec;

/// Why a report frame was dropped without any action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IgnoreReason {
    /// Fewer bytes than the fixed report length
    TooShort,
    /// The report header is not `A1 01 00 00`
    HeaderMismatch,
    /// Every key slot holds the rollover error code
    RolloverError,
}

/// A single key found in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyPress {
    /// Backspace, logged only
    Backspace,
    /// Enter, logged only
    Enter,
    /// A key bound to a television function, transmitted over IR
    Remote {
        /// Character on the key
        key: char,
        /// Function the key triggers
        function: RemoteFunction,
    },
    /// A non-zero code with no binding
    Unmapped {
        /// Raw usage code
        code: u8,
        /// Decoded character, [`keypad::NONE`] for unknown codes
        key: char,
    },
}

/// Result of processing one interrupt report
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportOutcome {
    /// Frame dropped silently
    Ignored(IgnoreReason),
    /// All keys released
    Released,
    /// Keys found in the frame, in slot order
    Keys(Vec<KeyPress, MAX_L2CAP_PAYLOAD>),
}

/// Validate a raw report and return its key bytes
///
/// # Errors
/// Returns the [`IgnoreReason`] for frames that must be dropped
pub fn key_slots(report: &[u8]) -> Result<&[u8], IgnoreReason> {
    if report.len() < REPORT_LENGTH {
        return Err(IgnoreReason::TooShort);
    }
    let (header, keys) = report.split_at(REPORT_HEADER.len());
    if header != REPORT_HEADER {
        return Err(IgnoreReason::HeaderMismatch);
    }
    if keys[..REPORT_KEY_SLOTS]
        .iter()
        .all(|&code| code == ROLLOVER_ERROR_CODE)
    {
        return Err(IgnoreReason::RolloverError);
    }
    Ok(keys)
}

/// Classify one non-zero key code
#[must_use]
pub fn classify(code: u8) -> KeyPress {
    match code {
        keypad::KEY_BACKSPACE => KeyPress::Backspace,
        keypad::KEY_ENTER => KeyPress::Enter,
        _ => {
            let key = keypad::decode(code);
            match RemoteFunction::for_key(key) {
                Some(function) => KeyPress::Remote { key, function },
                None => KeyPress::Unmapped { code, key },
            }
        }
    }
}

/// Process one raw interrupt report, transmitting an IR frame per bound key
///
/// Every non-zero slot is handled left to right. The keypad reports one key
/// at a time, so a frame with several keys simply sends several frames. At
/// most [`MAX_L2CAP_PAYLOAD`] keys are handled per report.
pub fn process_report<I: IrTransmitter + ?Sized>(report: &[u8], ir: &mut I) -> ReportOutcome {
    let keys = match key_slots(report) {
        Ok(keys) => keys,
        Err(reason) => {
            trace!("[REPORT] Ignoring report: {:?}", reason);
            return ReportOutcome::Ignored(reason);
        }
    };

    if keys[..REPORT_KEY_SLOTS].iter().all(|&code| code == 0) {
        info!("[REPORT] Key: Released");
        return ReportOutcome::Released;
    }

    let mut pressed = Vec::new();
    for &code in keys
        .iter()
        .filter(|&&code| code != 0)
        .take(MAX_L2CAP_PAYLOAD)
    {
        let press = classify(code);
        match press {
            KeyPress::Backspace => info!("[REPORT] Key: BackSpace"),
            KeyPress::Enter => info!("[REPORT] Key: Enter"),
            KeyPress::Remote { key, function } => {
                info!("[REPORT] Key: {}", key);
                ir::transmit(ir, function);
            }
            KeyPress::Unmapped { code, key } => {
                info!("[REPORT] Key: {} (unmapped code 0x{:02X})", key, code);
            }
        }
        // Cannot fail: the scan stops at the vector capacity
        pressed.push(press).ok();
    }
    ReportOutcome::Keys(pressed)
}
