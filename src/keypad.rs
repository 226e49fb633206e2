//! Numeric keypad key code decoding
//!
//! Maps the HID keyboard/keypad usage codes sent by the remote keypad to the
//! characters printed on its keys.

/// Usage code of the Backspace key
pub const KEY_BACKSPACE: u8 = 0x2A;

/// Usage code of the keypad Enter key
pub const KEY_ENTER: u8 = 0x58;

/// Character returned for Backspace
pub const BACKSPACE: char = '\u{8}';

/// Character returned for Enter
pub const ENTER: char = '\n';

/// Character returned for any code that is not a keypad key
pub const NONE: char = '\0';

/// Decode a single report byte into the character on the key
///
/// Unknown codes decode to [`NONE`].
#[must_use]
pub const fn decode(code: u8) -> char {
    match code {
        KEY_BACKSPACE => BACKSPACE,
        0x54 => '/',
        0x55 => '*',
        0x56 => '-',
        0x57 => '+',
        KEY_ENTER => ENTER,
        0x59 => '1',
        0x5A => '2',
        0x5B => '3',
        0x5C => '4',
        0x5D => '5',
        0x5E => '6',
        0x5F => '7',
        0x60 => '8',
        0x61 => '9',
        0x62 => '0',
        0x63 => '.',
        _ => NONE,
    }
}
