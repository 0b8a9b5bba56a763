//! STA350BW register map
//!
//! Addresses and bit layouts are fixed by the device family and never change
//! at runtime. Multi-bit fields are described by [`BitField`] so every
//! read-modify-write site shares the same mask arithmetic.

/// 7-bit control bus address with the ADDR pin low
pub const DEVICE_ADDRESS_1: u8 = 0x1C;
/// 7-bit control bus address with the ADDR pin high
pub const DEVICE_ADDRESS_2: u8 = 0x1D;

// Configuration registers A..F
pub const CONF_REGA: u8 = 0x00;
pub const CONF_REGB: u8 = 0x01;
pub const CONF_REGC: u8 = 0x02;
pub const CONF_REGD: u8 = 0x03;
pub const CONF_REGE: u8 = 0x04;
pub const CONF_REGF: u8 = 0x05;

/// Channel mute bits, see [`crate::Channel::mute_mask`]
pub const MUTE: u8 = 0x06;

/// Master volume; per-channel volume registers follow sequentially
pub const MVOL: u8 = 0x07;
pub const C1VOL: u8 = 0x08;
pub const C2VOL: u8 = 0x09;
pub const C3VOL: u8 = 0x0A;

// Per-channel configuration
pub const C1CFG: u8 = 0x0E;
pub const C2CFG: u8 = 0x0F;
pub const C3CFG: u8 = 0x10;

/// Bass/treble tone control gains
pub const TONE: u8 = 0x11;

/// Coefficient RAM address pointer (low 6 bits)
pub const CFADDR: u8 = 0x16;

// Coefficient byte registers, three per coefficient, most significant
// transmitted byte first
pub const B1CF1: u8 = 0x17;
pub const B1CF2: u8 = 0x18;
pub const B1CF3: u8 = 0x19;
pub const B2CF1: u8 = 0x1A;
pub const B2CF2: u8 = 0x1B;
pub const B2CF3: u8 = 0x1C;
pub const A1CF1: u8 = 0x1D;
pub const A1CF2: u8 = 0x1E;
pub const A1CF3: u8 = 0x1F;
pub const A2CF1: u8 = 0x20;
pub const A2CF2: u8 = 0x21;
pub const A2CF3: u8 = 0x22;
pub const B0CF1: u8 = 0x23;
pub const B0CF2: u8 = 0x24;
pub const B0CF3: u8 = 0x25;

/// Coefficient RAM update strobe
pub const CFUD: u8 = 0x26;

/// Device status (PLL lock, clock validity, fault bits)
pub const STATUS: u8 = 0x2D;

/// Equalizer configuration, low 2 bits select the active RAM bank
pub const EQCFG: u8 = 0x31;

/// Extended configuration (biquad 5..7 modes)
pub const CONFX: u8 = 0x36;

// Extended-range biquad assignment, 2 bits per biquad
pub const CXT_B4B1: u8 = 0x46;
pub const CXT_B7B5: u8 = 0x47;

/// Status register value once the PLL is locked and all clocks are good
pub const STATUS_GOOD: u8 = 0x7F;

/// Literal written to [`CFUD`] to latch freshly written RAM contents.
/// The hardware expects the full value, not a read-modify-write.
pub const CFUD_WRITE_ALL: u8 = 0x02;

/// A contiguous bitfield inside an 8-bit register
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct BitField {
    pub reg: u8,
    pub offset: u8,
    pub width: u8,
}

impl BitField {
    pub const fn new(reg: u8, offset: u8, width: u8) -> Self {
        Self { reg, offset, width }
    }

    pub const fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) as u8) << self.offset
    }

    /// Replaces this field inside `current`, leaving all other bits intact
    pub const fn apply(&self, current: u8, value: u8) -> u8 {
        (current & !self.mask()) | ((value << self.offset) & self.mask())
    }
}

/// Master clock ratio and interpolation-rate selection (CONF_REGA)
pub const CLOCK_SELECT: BitField = BitField::new(CONF_REGA, 0, 5);

/// Output stage enable bit set during init (CONF_REGF)
pub const OUTPUT_ENABLE: BitField = BitField::new(CONF_REGF, 7, 1);

/// Full output power stage field toggled by power on/off (CONF_REGF)
pub const OUTPUT_STAGE: BitField = BitField::new(CONF_REGF, 6, 2);

/// Active coefficient RAM bank (EQCFG)
pub const EQ_BANK_SELECT: BitField = BitField::new(EQCFG, 0, 2);

/// Coefficient RAM address pointer field (CFADDR)
pub const COEFF_ADDRESS: BitField = BitField::new(CFADDR, 0, 6);
