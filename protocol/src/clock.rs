//! Sample-rate clocking for both sides of the device.
//!
//! The codec side picks a master-clock ratio written into CONF_REGA; the
//! serial transport side needs a matching master-clock divider and PLL
//! preset. A sample-rate change is only complete once both agree.

use crate::UnsupportedRate;

/// CONF_REGA clock selection for the 32/44.1/48 kHz family, MCLK = 256*Fs
pub const MCS_256FS_48K_GROUP: u8 = 0x03;

/// CONF_REGA clock selection for the 88.2/96 kHz family, MCLK = 256*Fs
pub const MCS_256FS_96K_GROUP: u8 = 0x0B;

/// Returns the CONF_REGA clock-select value for a sample rate.
///
/// Only the rates the device can lock its PLL to are accepted; anything else
/// must be rejected before any register write happens.
pub fn mclk_select(rate: u32) -> Result<u8, UnsupportedRate> {
    match rate {
        32_000 | 44_100 | 48_000 => Ok(MCS_256FS_48K_GROUP),
        88_200 | 96_000 => Ok(MCS_256FS_96K_GROUP),
        other => Err(UnsupportedRate(other)),
    }
}

/// PLL multiplier/divider pair feeding the serial-bus master clock
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Debug))]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PllPreset {
    pub n: u8,
    pub p: u8,
}

/// Clock parameters the transport must apply for a given sample rate
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Debug))]
#[cfg_attr(feature = "use_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockSettings {
    pub rate: u32,
    pub mclk_divider: u8,
    pub pll: PllPreset,
}

impl ClockSettings {
    /// Default board clocking strategy.
    ///
    /// Rates in the 8 kHz multiple family share one PLL preset, the 44.1 kHz
    /// family the other; the divider then derives MCLK from the PLL output.
    pub fn for_rate(rate: u32) -> Self {
        let pll = if rate % 8 == 0 {
            PllPreset { n: 43, p: 7 }
        } else {
            PllPreset { n: 24, p: 17 }
        };

        let mclk_divider = match rate {
            8_000 => 12,
            11_025 => 2,
            16_000 => 6,
            22_050 => 1,
            32_000 => 3,
            44_100 => 0,
            48_000 => 2,
            _ => 1,
        };

        ClockSettings {
            rate,
            mclk_divider,
            pll,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mclk_select_groups() {
        for rate in [32_000, 44_100, 48_000] {
            assert_eq!(mclk_select(rate), Ok(MCS_256FS_48K_GROUP));
        }
        for rate in [88_200, 96_000] {
            assert_eq!(mclk_select(rate), Ok(MCS_256FS_96K_GROUP));
        }
        assert_eq!(mclk_select(22_050), Err(UnsupportedRate(22_050)));
        assert_eq!(mclk_select(0), Err(UnsupportedRate(0)));
    }

    #[test]
    fn clock_settings_pll_family() {
        assert_eq!(ClockSettings::for_rate(48_000).pll, PllPreset { n: 43, p: 7 });
        assert_eq!(
            ClockSettings::for_rate(44_100).pll,
            PllPreset { n: 24, p: 17 }
        );
        assert_eq!(ClockSettings::for_rate(44_100).mclk_divider, 0);
        assert_eq!(ClockSettings::for_rate(48_000).mclk_divider, 2);
    }
}
