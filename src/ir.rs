//! Infrared remote control output
//!
//! The keypad characters are bound to television remote functions through a
//! static table; each function is sent as a 32-bit NEC frame made of the
//! television's address mask and a 16-bit command code.

/// Number of bits in an NEC frame
pub const NEC_BITS: u8 = 32;

/// Infrared transmitter collaborator
///
/// Implementors generate the carrier-modulated NEC waveform on the IR LED.
pub trait IrTransmitter {
    /// Transmit one pulse-coded NEC frame of `bits` bits, MSB first
    fn send_nec(&mut self, frame: u32, bits: u8);
}

/// LG television NEC codes (32LS570S)
///
/// Constant names follow the labels printed on the LG remote.
#[allow(missing_docs)]
pub mod lg {
    /// Address part shared by every frame
    pub const NEC_INIT_MASK: u32 = 0x20DF_0000;

    pub const POWER: u16 = 0x10EF;
    pub const VOL_PLUS: u16 = 0x40BF;
    pub const VOL_LESS: u16 = 0xC03F;
    pub const PROG_PLUS: u16 = 0x00FF;
    pub const PROG_LESS: u16 = 0x807F;
    pub const NUMBER_0: u16 = 0x08F7;
    pub const NUMBER_1: u16 = 0x8877;
    pub const NUMBER_2: u16 = 0x48B7;
    pub const NUMBER_3: u16 = 0xC837;
    pub const NUMBER_4: u16 = 0x28D7;
    pub const NUMBER_5: u16 = 0xA857;
    pub const NUMBER_6: u16 = 0x6897;
    pub const NUMBER_7: u16 = 0xE817;
    pub const NUMBER_8: u16 = 0x18E7;
    pub const NUMBER_9: u16 = 0x9867;
}

/// Television remote control function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteFunction {
    /// Numeric key 0-9
    Number(u8),
    /// Volume up
    VolumeUp,
    /// Volume down
    VolumeDown,
    /// Next channel
    ChannelUp,
    /// Previous channel
    ChannelDown,
    /// Power toggle
    Power,
}

/// Keypad character to remote function bindings
pub static KEY_BINDINGS: [(char, RemoteFunction); 15] = [
    ('0', RemoteFunction::Number(0)),
    ('1', RemoteFunction::Number(1)),
    ('2', RemoteFunction::Number(2)),
    ('3', RemoteFunction::Number(3)),
    ('4', RemoteFunction::Number(4)),
    ('5', RemoteFunction::Number(5)),
    ('6', RemoteFunction::Number(6)),
    ('7', RemoteFunction::Number(7)),
    ('8', RemoteFunction::Number(8)),
    ('9', RemoteFunction::Number(9)),
    ('+', RemoteFunction::VolumeUp),
    ('-', RemoteFunction::VolumeDown),
    ('*', RemoteFunction::ChannelUp),
    ('/', RemoteFunction::ChannelDown),
    ('.', RemoteFunction::Power),
];

impl RemoteFunction {
    /// Look up the function bound to a keypad character
    #[must_use]
    pub fn for_key(key: char) -> Option<Self> {
        KEY_BINDINGS
            .iter()
            .find(|(bound, _)| *bound == key)
            .map(|&(_, function)| function)
    }

    /// 16-bit LG command code, `None` for digits above 9
    #[must_use]
    pub const fn code(self) -> Option<u16> {
        const NUMBERS: [u16; 10] = [
            lg::NUMBER_0,
            lg::NUMBER_1,
            lg::NUMBER_2,
            lg::NUMBER_3,
            lg::NUMBER_4,
            lg::NUMBER_5,
            lg::NUMBER_6,
            lg::NUMBER_7,
            lg::NUMBER_8,
            lg::NUMBER_9,
        ];

        match self {
            Self::Number(n) if (n as usize) < NUMBERS.len() => Some(NUMBERS[n as usize]),
            Self::Number(_) => None,
            Self::VolumeUp => Some(lg::VOL_PLUS),
            Self::VolumeDown => Some(lg::VOL_LESS),
            Self::ChannelUp => Some(lg::PROG_PLUS),
            Self::ChannelDown => Some(lg::PROG_LESS),
            Self::Power => Some(lg::POWER),
        }
    }

    /// Full 32-bit NEC frame for this function
    #[must_use]
    pub const fn nec_frame(self) -> Option<u32> {
        match self.code() {
            Some(code) => Some(lg::NEC_INIT_MASK | code as u32),
            None => None,
        }
    }
}

/// Send the NEC frame bound to `function`
///
/// Returns `false` when the function has no code and nothing was sent.
pub fn transmit<I: IrTransmitter + ?Sized>(ir: &mut I, function: RemoteFunction) -> bool {
    match function.nec_frame() {
        Some(frame) => {
            debug!("[IR] Sending NEC frame 0x{:08X}", frame);
            ir.send_nec(frame, NEC_BITS);
            true
        }
        None => {
            warn!("[IR] No code bound to {:?}", function);
            false
        }
    }
}
