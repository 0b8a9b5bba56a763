#![cfg_attr(not(feature = "std"), no_std)]

//! Control protocol for the STA350BW "sound terminal" amplifier family.
//!
//! This crate describes the device: its register map, the bitfield layout of
//! the configuration registers, the biquad coefficient RAM encoding and the
//! sample-rate clocking constants. It is meant to be as lean as possible in
//! order to run in restricted environments, and for this reason it doesn't
//! include any bus or transport implementations.

pub mod clock;
pub mod coefficients;
pub mod option;
pub mod regs;

pub use clock::ClockSettings;
pub use coefficients::BiquadCoefficients;
pub use option::DspOption;

/// A sample rate the device has no clock ratio for
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Debug, thiserror::Error))]
#[cfg_attr(feature = "debug", error("unsupported sample rate: {0} Hz"))]
pub struct UnsupportedRate(pub u32);

/// Output channel selector.
///
/// The mute register treats channels as OR-able bitmasks while the volume
/// registers are laid out sequentially after the master volume register, so
/// both encodings are exposed explicitly.
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
#[cfg_attr(feature = "use_serde", strum(serialize_all = "lowercase"))]
pub enum Channel {
    Master,
    Ch1,
    Ch2,
    Ch3,
}

impl Channel {
    /// Bit selecting this channel in the mute register
    pub fn mute_mask(self) -> u8 {
        match self {
            Channel::Master => 0x01,
            Channel::Ch1 => 0x02,
            Channel::Ch2 => 0x04,
            Channel::Ch3 => 0x08,
        }
    }

    /// Offset added to [`regs::MVOL`] to reach this channel's volume register
    pub fn volume_offset(self) -> u8 {
        match self {
            Channel::Master => 0,
            Channel::Ch1 => 1,
            Channel::Ch2 => 2,
            Channel::Ch3 => 3,
        }
    }
}

/// Binary enable/disable state for mute and DSP toggles
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
#[cfg_attr(feature = "use_serde", strum(serialize_all = "lowercase"))]
pub enum Switch {
    Disable,
    Enable,
}

impl Switch {
    pub fn is_on(self) -> bool {
        matches!(self, Switch::Enable)
    }
}

impl From<bool> for Switch {
    fn from(value: bool) -> Self {
        if value {
            Switch::Enable
        } else {
            Switch::Disable
        }
    }
}

/// One of the four coefficient RAM banks, used for double-buffered filter
/// updates. Values outside 0..=3 are masked down to the field width.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "debug", derive(Debug))]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RamBank(pub u8);

impl RamBank {
    pub fn bits(self) -> u8 {
        self.0 & 0x03
    }
}
