//! DSP option multiplexing
//!
//! Every tunable DSP flag maps to exactly one bitfield in one configuration
//! register; setting an option is always a single read-modify-write through
//! the table below. Because the options are an enum, there is no
//! unrecognized-identifier path: the mapping is total.

use crate::regs::{self, BitField};

/// Tunable DSP flags and fields
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Debug))]
#[cfg_attr(
    feature = "use_serde",
    derive(
        strum::EnumString,
        strum::Display,
        serde::Serialize,
        serde::Deserialize,
    )
)]
#[cfg_attr(feature = "use_serde", strum(serialize_all = "snake_case"))]
pub enum DspOption {
    /// Bypass the full DSP section
    DspBypass,
    /// Bypass the high-pass filter
    HighPassBypass,
    /// De-emphasis filter
    Deemphasis,
    /// Link channel 1/2 biquad coefficients
    BiquadLink,
    /// Second-order mode for biquads 5..7
    Biquad5,
    Biquad6,
    Biquad7,
    /// Per-channel equalizer bypass
    C1EqBypass,
    C2EqBypass,
    /// Per-channel tone control bypass
    C1ToneControlBypass,
    C2ToneControlBypass,
    /// Per-channel volume bypass
    C1VolumeBypass,
    C2VolumeBypass,
    /// Extended-range coefficient bank assignment for biquads 1..7
    ExtRangeBq1,
    ExtRangeBq2,
    ExtRangeBq3,
    ExtRangeBq4,
    ExtRangeBq5,
    ExtRangeBq6,
    ExtRangeBq7,
    /// Globally selects the active coefficient RAM bank
    RamBankSelect,
}

impl DspOption {
    pub const ALL: [DspOption; 21] = [
        DspOption::DspBypass,
        DspOption::HighPassBypass,
        DspOption::Deemphasis,
        DspOption::BiquadLink,
        DspOption::Biquad5,
        DspOption::Biquad6,
        DspOption::Biquad7,
        DspOption::C1EqBypass,
        DspOption::C2EqBypass,
        DspOption::C1ToneControlBypass,
        DspOption::C2ToneControlBypass,
        DspOption::C1VolumeBypass,
        DspOption::C2VolumeBypass,
        DspOption::ExtRangeBq1,
        DspOption::ExtRangeBq2,
        DspOption::ExtRangeBq3,
        DspOption::ExtRangeBq4,
        DspOption::ExtRangeBq5,
        DspOption::ExtRangeBq6,
        DspOption::ExtRangeBq7,
        DspOption::RamBankSelect,
    ];

    /// The register bitfield this option occupies
    pub fn field(self) -> BitField {
        use DspOption::*;
        match self {
            DspBypass => BitField::new(regs::CONF_REGD, 2, 1),
            HighPassBypass => BitField::new(regs::CONF_REGD, 0, 1),
            Deemphasis => BitField::new(regs::CONF_REGD, 1, 1),
            BiquadLink => BitField::new(regs::CONF_REGD, 3, 1),
            Biquad5 => BitField::new(regs::CONFX, 2, 1),
            Biquad6 => BitField::new(regs::CONFX, 1, 1),
            Biquad7 => BitField::new(regs::CONFX, 0, 1),
            C1EqBypass => BitField::new(regs::C1CFG, 1, 1),
            C2EqBypass => BitField::new(regs::C2CFG, 1, 1),
            C1ToneControlBypass => BitField::new(regs::C1CFG, 0, 1),
            C2ToneControlBypass => BitField::new(regs::C2CFG, 0, 1),
            C1VolumeBypass => BitField::new(regs::C1CFG, 2, 1),
            C2VolumeBypass => BitField::new(regs::C2CFG, 2, 1),
            ExtRangeBq1 => BitField::new(regs::CXT_B4B1, 0, 2),
            ExtRangeBq2 => BitField::new(regs::CXT_B4B1, 2, 2),
            ExtRangeBq3 => BitField::new(regs::CXT_B4B1, 4, 2),
            ExtRangeBq4 => BitField::new(regs::CXT_B4B1, 6, 2),
            ExtRangeBq5 => BitField::new(regs::CXT_B7B5, 0, 2),
            ExtRangeBq6 => BitField::new(regs::CXT_B7B5, 2, 2),
            ExtRangeBq7 => BitField::new(regs::CXT_B7B5, 4, 2),
            RamBankSelect => regs::EQ_BANK_SELECT,
        }
    }

    /// Maps the caller's state code onto the field value.
    ///
    /// The extended-range options only latch the top bits of their 2-bit
    /// state code, so the incoming value is pre-shifted right by one.
    pub fn encode_state(self, state: u8) -> u8 {
        use DspOption::*;
        match self {
            ExtRangeBq1 | ExtRangeBq2 | ExtRangeBq3 | ExtRangeBq4 | ExtRangeBq5 | ExtRangeBq6
            | ExtRangeBq7 => state >> 1,
            _ => state,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_is_total_and_well_formed() {
        for option in DspOption::ALL {
            let field = option.field();
            assert!(field.width == 1 || field.width == 2);
            assert!(field.offset + field.width <= 8);
        }
    }

    #[test]
    fn extended_range_state_is_preshifted() {
        assert_eq!(DspOption::ExtRangeBq3.encode_state(0x02), 0x01);
        assert_eq!(DspOption::ExtRangeBq7.encode_state(0x03), 0x01);
        // Plain toggles and the bank select keep the raw state
        assert_eq!(DspOption::DspBypass.encode_state(0x01), 0x01);
        assert_eq!(DspOption::RamBankSelect.encode_state(0x02), 0x02);
    }

    #[test]
    fn options_do_not_overlap() {
        for (i, a) in DspOption::ALL.iter().enumerate() {
            for b in &DspOption::ALL[i + 1..] {
                let (fa, fb) = (a.field(), b.field());
                if fa.reg == fb.reg {
                    assert_eq!(fa.mask() & fb.mask(), 0, "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }
}
