//! Biquad filter coefficient encoding
//!
//! One equalizer filter is a second-order IIR stage described by five 24-bit
//! coefficients carried in the low bytes of a `u32`, in the order the device
//! transfers them: B1, B2, A1, A2, B0. Loading a filter means pointing the
//! coefficient RAM at the filter's base address and issuing fifteen byte
//! writes, three per coefficient.

use crate::regs;

/// Register triplets per coefficient, most significant transmitted byte first
const CF_REGS: [[u8; 3]; 5] = [
    [regs::B1CF1, regs::B1CF2, regs::B1CF3],
    [regs::B2CF1, regs::B2CF2, regs::B2CF3],
    [regs::A1CF1, regs::A1CF2, regs::A1CF3],
    [regs::A2CF1, regs::A2CF2, regs::A2CF3],
    [regs::B0CF1, regs::B0CF2, regs::B0CF3],
];

/// Coefficients for one biquad stage, 24 significant bits each
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "debug", derive(Debug))]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BiquadCoefficients {
    pub b1: u32,
    pub b2: u32,
    pub a1: u32,
    pub a2: u32,
    pub b0: u32,
}

impl BiquadCoefficients {
    pub const fn new(b1: u32, b2: u32, a1: u32, a2: u32, b0: u32) -> Self {
        Self { b1, b2, a1, a2, b0 }
    }

    /// Base RAM address of a filter; each filter occupies 5 sequential slots
    pub fn ram_address(filter: u8) -> u8 {
        filter.wrapping_mul(5) & regs::COEFF_ADDRESS.mask()
    }

    fn as_array(&self) -> [u32; 5] {
        [self.b1, self.b2, self.a1, self.a2, self.b0]
    }

    /// The fifteen ordered `(register, byte)` writes loading this filter.
    ///
    /// Within one coefficient the bytes go out in descending significance;
    /// the top byte of each `u32` (sign/overflow) is never transmitted.
    pub fn register_writes(&self) -> [(u8, u8); 15] {
        let mut out = [(0u8, 0u8); 15];
        for (i, (coeff, cf)) in self.as_array().iter().zip(CF_REGS.iter()).enumerate() {
            let bytes = coeff.to_be_bytes();
            out[i * 3] = (cf[0], bytes[1]);
            out[i * 3 + 1] = (cf[1], bytes[2]);
            out[i * 3 + 2] = (cf[2], bytes[3]);
        }
        out
    }
}

impl From<[u32; 5]> for BiquadCoefficients {
    /// Coefficients in transfer order: B1, B2, A1, A2, B0
    fn from(values: [u32; 5]) -> Self {
        Self::new(values[0], values[1], values[2], values[3], values[4])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ram_addressing() {
        assert_eq!(BiquadCoefficients::ram_address(0), 0x00);
        assert_eq!(BiquadCoefficients::ram_address(1), 0x05);
        assert_eq!(BiquadCoefficients::ram_address(7), 0x23);
        // Wraps within the 6-bit address field
        assert_eq!(BiquadCoefficients::ram_address(13), 0x01);
    }

    #[test]
    fn write_plan_is_literal() {
        let coeffs = BiquadCoefficients::from([0x0011_2233, 0x0044_5566, 0x0077_8899, 0x00AA_BBCC, 0x007F_FFFF]);
        assert_eq!(
            coeffs.register_writes(),
            [
                (regs::B1CF1, 0x11),
                (regs::B1CF2, 0x22),
                (regs::B1CF3, 0x33),
                (regs::B2CF1, 0x44),
                (regs::B2CF2, 0x55),
                (regs::B2CF3, 0x66),
                (regs::A1CF1, 0x77),
                (regs::A1CF2, 0x88),
                (regs::A1CF3, 0x99),
                (regs::A2CF1, 0xAA),
                (regs::A2CF2, 0xBB),
                (regs::A2CF3, 0xCC),
                (regs::B0CF1, 0x7F),
                (regs::B0CF2, 0xFF),
                (regs::B0CF3, 0xFF),
            ]
        );
    }

    #[test]
    fn sign_byte_is_dropped() {
        let coeffs = BiquadCoefficients::new(0xFF00_0001, 0, 0, 0, 0);
        let writes = coeffs.register_writes();
        assert_eq!(writes[0], (regs::B1CF1, 0x00));
        assert_eq!(writes[2], (regs::B1CF3, 0x01));
    }
}
