use bitflags::bitflags;

/// Default I2C address of the QMC5883L on the GY-271 breakout
pub const I2C_ADDRESS: u8 = 0x0D;

/// X-axis output value registers, LSB first
pub const REG_OUT_X_L: u8 = 0x00;
pub const REG_OUT_X_H: u8 = 0x01;
// Y-axis output value registers
pub const REG_OUT_Y_L: u8 = 0x02;
pub const REG_OUT_Y_H: u8 = 0x03;
// Z-axis output value registers
pub const REG_OUT_Z_L: u8 = 0x04;
pub const REG_OUT_Z_H: u8 = 0x05;

/// Status register
pub const REG_STATUS: u8 = 0x06;

/// Control register
pub const REG_CONTROL: u8 = 0x09;

/// SET/RESET period register, must be rewritten before every control
/// register update
pub const REG_SET_RESET_PERIOD: u8 = 0x0B;

/// Fixed SET/RESET period payload from the vendor register map
pub const SET_RESET_PERIOD_RECOMMENDED: u8 = 0x01;

/// Word the device reports for an axis it could not measure
pub const OVERFLOW_SENTINEL: i16 = -4096;

bitflags! {
    /// Status register contents. Bits 3..7 are undefined on this part and
    /// get dropped on decode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// New sample set is ready in the output registers
        const DATA_READY   = 1 << 0;
        /// At least one axis exceeded the measurement range
        const OVERFLOW     = 1 << 1;
        /// A sample set was dropped before being read out
        const DATA_SKIPPED = 1 << 2;
    }
}

impl Status {
    pub fn data_ready(&self) -> bool {
        self.contains(Status::DATA_READY)
    }

    pub fn overflow(&self) -> bool {
        self.contains(Status::OVERFLOW)
    }

    pub fn data_skipped(&self) -> bool {
        self.contains(Status::DATA_SKIPPED)
    }
}

/// MODE field location in the control register
pub const MODE_SHIFT: u8 = 0;
/// ODR field location
pub const ODR_SHIFT: u8 = 3;
/// RNG field location
pub const RNG_SHIFT: u8 = 5;
/// OSR field location
pub const OSR_SHIFT: u8 = 7;

/// Measurement mode, control register bit 0.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Mode {
    Standby = 0x00,
    Continuous = 0x01,
}

impl Mode {
    pub const fn bits(self) -> u8 {
        (self as u8) << MODE_SHIFT
    }
}

/// Output data rate. Discriminants are the vendor register map's raw ODR
/// field patterns.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum OutputRate {
    Hz10 = 0x00,
    Hz50 = 0x01,
    Hz100 = 0x10,
    Hz200 = 0x11,
}

impl OutputRate {
    /// Total over all inputs: any rate the part does not support selects
    /// 50 Hz.
    pub const fn from_hz(hz: u16) -> Self {
        match hz {
            10 => OutputRate::Hz10,
            50 => OutputRate::Hz50,
            100 => OutputRate::Hz100,
            200 => OutputRate::Hz200,
            _ => OutputRate::Hz50,
        }
    }

    pub const fn bits(self) -> u8 {
        (self as u8) << ODR_SHIFT
    }
}

/// Full-scale field range. The RNG patterns are opaque vendor values,
/// kept verbatim.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum FieldRange {
    Gauss2 = 0x00,
    Gauss8 = 0x01,
}

impl FieldRange {
    /// Unsupported ranges select the wide 8 gauss setting.
    pub const fn from_gauss(gauss: u16) -> Self {
        match gauss {
            2 => FieldRange::Gauss2,
            8 => FieldRange::Gauss8,
            _ => FieldRange::Gauss8,
        }
    }

    pub const fn bits(self) -> u8 {
        (self as u8) << RNG_SHIFT
    }
}

/// Oversampling ratio, internal samples averaged per reported measurement.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum OversamplingRatio {
    Osr512 = 0x00,
    Osr256 = 0x01,
    Osr128 = 0x10,
    Osr64 = 0x11,
}

impl OversamplingRatio {
    /// Unsupported ratios select 256 samples.
    pub const fn from_ratio(ratio: u16) -> Self {
        match ratio {
            512 => OversamplingRatio::Osr512,
            256 => OversamplingRatio::Osr256,
            128 => OversamplingRatio::Osr128,
            64 => OversamplingRatio::Osr64,
            _ => OversamplingRatio::Osr256,
        }
    }

    /// Shifted in u8; pattern bits pushed past bit 7 truncate exactly as
    /// a byte-wide register write of the oversized value would.
    pub const fn bits(self) -> u8 {
        (self as u8) << OSR_SHIFT
    }
}

/// The four control register fields. The wire byte is the OR of the four
/// field encodings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ControlConfig {
    pub mode: Mode,
    pub output_rate: OutputRate,
    pub field_range: FieldRange,
    pub oversampling: OversamplingRatio,
}

impl ControlConfig {
    /// Build from raw numeric settings. Values the part does not support
    /// select the defaults (50 Hz, 8 gauss, 256 samples) instead of
    /// failing.
    pub const fn from_raw(mode: Mode, hz: u16, gauss: u16, ratio: u16) -> Self {
        Self {
            mode,
            output_rate: OutputRate::from_hz(hz),
            field_range: FieldRange::from_gauss(gauss),
            oversampling: OversamplingRatio::from_ratio(ratio),
        }
    }

    pub const fn to_byte(&self) -> u8 {
        self.mode.bits() | self.output_rate.bits() | self.field_range.bits() | self.oversampling.bits()
    }
}

impl Default for ControlConfig {
    /// Continuous measurement at 50 Hz, 8 gauss range, 256-sample
    /// oversampling.
    fn default() -> Self {
        Self {
            mode: Mode::Continuous,
            output_rate: OutputRate::Hz50,
            field_range: FieldRange::Gauss8,
            oversampling: OversamplingRatio::Osr256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_rate_is_total() {
        assert_eq!(OutputRate::from_hz(10), OutputRate::Hz10);
        assert_eq!(OutputRate::from_hz(200), OutputRate::Hz200);
        // everything else falls back to 50 Hz
        assert_eq!(OutputRate::from_hz(0), OutputRate::Hz50);
        assert_eq!(OutputRate::from_hz(77), OutputRate::Hz50);
        assert_eq!(OutputRate::from_hz(u16::MAX), OutputRate::Hz50);
        assert_eq!(OutputRate::from_hz(77).bits(), OutputRate::from_hz(50).bits());
    }

    #[test]
    fn range_and_oversampling_defaults() {
        assert_eq!(FieldRange::from_gauss(2), FieldRange::Gauss2);
        assert_eq!(FieldRange::from_gauss(4), FieldRange::Gauss8);
        assert_eq!(OversamplingRatio::from_ratio(64), OversamplingRatio::Osr64);
        assert_eq!(OversamplingRatio::from_ratio(1024), OversamplingRatio::Osr256);
    }

    #[test]
    fn field_encodings_use_vendor_patterns() {
        assert_eq!(OutputRate::Hz50.bits(), 0x01 << 3);
        // the raw 0x10/0x11 patterns from the vendor map are preserved
        assert_eq!(OutputRate::Hz100.bits(), 0x80);
        assert_eq!(OutputRate::Hz200.bits(), 0x88);
        assert_eq!(FieldRange::Gauss8.bits(), 0x20);
        assert_eq!(OversamplingRatio::Osr256.bits(), 0x80);
    }

    #[test]
    fn control_byte_round_trip_with_out_of_set_rate() {
        let picked = ControlConfig::from_raw(Mode::Continuous, 77, 8, 256);
        let default = ControlConfig::default();
        assert_eq!(picked, default);
        assert_eq!(picked.to_byte(), default.to_byte());
        assert_eq!(
            default.to_byte(),
            Mode::Continuous.bits()
                | OutputRate::Hz50.bits()
                | FieldRange::Gauss8.bits()
                | OversamplingRatio::Osr256.bits()
        );
        assert_eq!(default.to_byte(), 0xA9);
    }

    #[test]
    fn status_bits_decode_independently() {
        let status = Status::from_bits_truncate(0b0000_0101);
        assert!(status.data_ready());
        assert!(!status.overflow());
        assert!(status.data_skipped());

        assert!(Status::from_bits_truncate(0x00).is_empty());
        assert_eq!(Status::from_bits_truncate(0xFF), Status::all());
    }

    #[test]
    fn status_ignores_bits_above_two() {
        let status = Status::from_bits_truncate(0b1111_1000);
        assert!(status.is_empty());
    }
}
