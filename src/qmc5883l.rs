use embedded_hal_async::i2c::I2c;
use libm::{atan2f, floorf, roundf};
use nalgebra::Vector3;

use crate::reg_data::qmc5883l::*;

/// PI, f32
pub const PI: f32 = core::f32::consts::PI;

/// PI / 180, for conversion to radians
pub const PI_180: f32 = PI / 180.0;

#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum QMC5883LError<CommE> {
    /// I2C bus error
    Comm(CommE),

    /// Heading requested while the x or y axis had no usable sample
    MissingAxisData,
}

/// One decoded sample set. An axis the device could not measure is
/// reported absent rather than as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct AxisReading {
    pub x: Option<i16>,
    pub y: Option<i16>,
    pub z: Option<i16>,
}

impl AxisReading {
    /// The reading as a vector, if every axis produced a sample
    pub fn vector(&self) -> Option<Vector3<i16>> {
        match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => Some(Vector3::new(x, y, z)),
            _ => None,
        }
    }
}

/// Magnetic declination of the mounting site, stored as entered plus the
/// derived radian offset applied to every heading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Declination {
    degrees: i16,
    minutes: i16,
    radians: f32,
}

impl Declination {
    pub fn new(degrees: i16, minutes: i16) -> Self {
        let radians = (degrees as f32 + minutes as f32 / 60.0) * PI_180;
        Self {
            degrees,
            minutes,
            radians,
        }
    }

    pub fn degrees(&self) -> i16 {
        self.degrees
    }

    pub fn minutes(&self) -> i16 {
        self.minutes
    }

    pub fn radians(&self) -> f32 {
        self.radians
    }
}

/// Compass bearing as whole degrees in [0, 360) plus minutes of arc in
/// [0, 60)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Heading {
    pub degrees: u16,
    pub minutes: u8,
}

/// Handles all operations on/with the QMC5883L
#[derive(Debug)]
pub struct QMC5883L<I2C> {
    i2c: I2C,
    address: u8,
    declination: Declination,
}

impl<I2C, CommE> QMC5883L<I2C>
where
    I2C: I2c<Error = CommE>,
    CommE: core::fmt::Debug,
{
    /// Side effect free constructor at the default GY-271 address
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS,
            declination: Declination::default(),
        }
    }

    /// Same as `new`, but the chip address can be specified
    pub fn new_with_addr(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            declination: Declination::default(),
        }
    }

    /// Release the bus handle
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// Configure with the part defaults: continuous 50 Hz, 8 gauss,
    /// 256-sample oversampling
    pub async fn init(&mut self) -> Result<(), QMC5883LError<CommE>> {
        self.configure(ControlConfig::default()).await
    }

    /// Write a full control register configuration. The SET/RESET period
    /// register must be rewritten before every control register update,
    /// so it goes out first.
    pub async fn configure(&mut self, config: ControlConfig) -> Result<(), QMC5883LError<CommE>> {
        self.write_reg(REG_SET_RESET_PERIOD, SET_RESET_PERIOD_RECOMMENDED)
            .await?;

        let control = config.to_byte();
        #[cfg(feature = "defmt-03")]
        defmt::debug!("control register set to {}", control);
        self.write_reg(REG_CONTROL, control).await
    }

    /// Read and decode all three axes. Six single register reads; the
    /// device may update the output registers between them, so gate on
    /// [`Status::data_ready`] when consistency matters.
    pub async fn read_axes(&mut self) -> Result<AxisReading, QMC5883LError<CommE>> {
        let x = self.read_axis_word(REG_OUT_X_L, REG_OUT_X_H).await?;
        let y = self.read_axis_word(REG_OUT_Y_L, REG_OUT_Y_H).await?;
        let z = self.read_axis_word(REG_OUT_Z_L, REG_OUT_Z_H).await?;

        Ok(AxisReading {
            x: axis_sample(x),
            y: axis_sample(y),
            z: axis_sample(z),
        })
    }

    /// Read the status register
    pub async fn read_status(&mut self) -> Result<Status, QMC5883LError<CommE>> {
        let status = self.read_reg(REG_STATUS).await?;
        Ok(Status::from_bits_truncate(status))
    }

    /// Store the local magnetic declination applied to every heading
    pub fn set_declination(&mut self, degrees: i16, minutes: i16) {
        self.declination = Declination::new(degrees, minutes);
    }

    pub fn declination(&self) -> Declination {
        self.declination
    }

    /// Declination-corrected compass bearing from a fresh axis reading.
    /// Fails rather than guessing when the x or y axis overflowed; a zero
    /// substitute would read as a valid bearing.
    pub async fn heading(&mut self) -> Result<Heading, QMC5883LError<CommE>> {
        let axes = self.read_axes().await?;

        match (axes.x, axes.y) {
            (Some(x), Some(y)) => Ok(heading_from_flat(x, y, self.declination.radians())),
            _ => {
                #[cfg(feature = "defmt-03")]
                defmt::debug!("heading requested without x/y axis data");
                Err(QMC5883LError::MissingAxisData)
            }
        }
    }

    async fn read_axis_word(&mut self, low_reg: u8, high_reg: u8) -> Result<i16, QMC5883LError<CommE>> {
        let low = self.read_reg(low_reg).await?;
        let high = self.read_reg(high_reg).await?;
        Ok(word_from_bytes(low, high))
    }

    async fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), QMC5883LError<CommE>> {
        let write_buf = [reg, val];

        self.i2c
            .write(self.address, &write_buf)
            .await
            .map_err(QMC5883LError::Comm)?;
        Ok(())
    }

    async fn read_reg(&mut self, reg: u8) -> Result<u8, QMC5883LError<CommE>> {
        let cmd_buf = [reg];
        let mut recv_buf = [0u8; 1];

        self.i2c
            .write_read(self.address, &cmd_buf, &mut recv_buf)
            .await
            .map_err(QMC5883LError::Comm)?;

        Ok(recv_buf[0])
    }
}

/// Combine the low and high output register bytes of one axis into a
/// signed two's-complement sample
const fn word_from_bytes(low: u8, high: u8) -> i16 {
    i16::from_be_bytes([high, low])
}

/// An overflowed axis comes back as the sentinel word, never as a value
const fn axis_sample(raw: i16) -> Option<i16> {
    if raw == OVERFLOW_SENTINEL {
        None
    } else {
        Some(raw)
    }
}

/// Bearing from the horizontal field components plus the declination
/// offset. atan2 output and the offset are both bounded, so a single wrap
/// in each direction normalizes into [0, 2*PI].
fn heading_from_flat(x: i16, y: i16, declination_rad: f32) -> Heading {
    let mut rad = atan2f(y as f32, x as f32) + declination_rad;

    if rad < 0.0 {
        rad += 2.0 * PI;
    }
    if rad > 2.0 * PI {
        rad -= 2.0 * PI;
    }

    let deg = rad * 180.0 / PI;
    let mut degrees = floorf(deg) as u16;
    let mut minutes = roundf((deg - floorf(deg)) * 60.0) as u8;

    // minutes round to 60 at 59.5'; carry into the degree field
    if minutes == 60 {
        minutes = 0;
        degrees += 1;
        if degrees == 360 {
            degrees = 0;
        }
    }

    Heading { degrees, minutes }
}
