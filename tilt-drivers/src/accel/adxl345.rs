//! ADXL345 3-axis accelerometer (I2C mode)
//!
//! # Bus Protocol
//!
//! - 7-bit address 0x53 with ALT ADDRESS grounded, 0x1D with it high
//! - Register write: address, register offset, one data byte
//! - Burst read: register pointer write, then consecutive bytes with
//!   auto-increment
//!
//! # Data Format
//!
//! Each axis is a signed 16-bit little-endian pair (DATAx0 = low byte).
//! Only the two range bits of DATA_FORMAT are used; every other format flag
//! (full resolution, justify, self test, interrupt polarity) is written as 0,
//! which keeps the fixed 10-bit resolution and a range-dependent scale factor.

use tilt_core::convert::{AccelSample, RawSample};
use tilt_core::traits::{Accelerometer, SensorError};
use tilt_hal::i2c::I2cBus;

/// ADXL345 Register addresses
pub mod reg {
    /// Device ID (reads 0xE5)
    pub const DEVID: u8 = 0x00;
    /// X-axis offset
    pub const OFSX: u8 = 0x1E;
    /// Y-axis offset
    pub const OFSY: u8 = 0x1F;
    /// Z-axis offset
    pub const OFSZ: u8 = 0x20;
    /// Data rate and power mode control
    pub const BW_RATE: u8 = 0x2C;
    /// Power-saving features control
    pub const POWER_CTL: u8 = 0x2D;
    /// Data format control
    pub const DATA_FORMAT: u8 = 0x31;
    /// X-axis data, low byte
    pub const DATAX0: u8 = 0x32;
    /// X-axis data, high byte
    pub const DATAX1: u8 = 0x33;
    /// Y-axis data, low byte
    pub const DATAY0: u8 = 0x34;
    /// Y-axis data, high byte
    pub const DATAY1: u8 = 0x35;
    /// Z-axis data, low byte
    pub const DATAZ0: u8 = 0x36;
    /// Z-axis data, high byte
    pub const DATAZ1: u8 = 0x37;
}

/// Bus address with ALT ADDRESS grounded
pub const DEFAULT_ADDRESS: u8 = 0x53;
/// Bus address with ALT ADDRESS high
pub const ALT_ADDRESS: u8 = 0x1D;
/// Fixed DEVID contents
pub const DEVICE_ID: u8 = 0xE5;

/// POWER_CTL: measurement mode
const POWER_CTL_MEASURE: u8 = 0x08;
/// POWER_CTL: standby
const POWER_CTL_STANDBY: u8 = 0x00;
/// DATA_FORMAT: range select bits
const DATA_FORMAT_RANGE_MASK: u8 = 0x03;

/// Full-scale measurement range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Range {
    /// ±2 g
    #[default]
    G2 = 0x00,
    /// ±4 g
    G4 = 0x01,
    /// ±8 g
    G8 = 0x02,
    /// ±16 g
    G16 = 0x03,
}

impl Range {
    /// g per LSB at the fixed 10-bit resolution
    pub const fn scale_factor(self) -> f32 {
        match self {
            Range::G2 => 0.004,
            Range::G4 => 0.008,
            Range::G8 => 0.016,
            Range::G16 => 0.032,
        }
    }

    /// DATA_FORMAT value selecting this range
    pub const fn data_format(self) -> u8 {
        self as u8 & DATA_FORMAT_RANGE_MASK
    }
}

/// Output data rate (BW_RATE, normal power)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    Hz3200 = 0x0F,
    Hz1600 = 0x0E,
    Hz800 = 0x0D,
    Hz400 = 0x0C,
    Hz200 = 0x0B,
    Hz100 = 0x0A,
    Hz50 = 0x09,
    Hz25 = 0x08,
}

/// ADXL345 errors
///
/// Each variant carries the bus error that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Adxl345Error<E> {
    /// A configuration register write failed
    Configuration(E),
    /// A register read failed
    Read(E),
    /// DEVID did not read 0xE5
    WrongDevice(u8),
}

impl<E> From<Adxl345Error<E>> for SensorError {
    fn from(e: Adxl345Error<E>) -> Self {
        match e {
            Adxl345Error::Configuration(_) => SensorError::Configuration,
            Adxl345Error::Read(_) => SensorError::Read,
            Adxl345Error::WrongDevice(id) => SensorError::WrongDevice(id),
        }
    }
}

/// ADXL345 driver
///
/// Owns the bus handle and the active range. The scale factor is derived
/// from the last range the device accepted, so a failed range change can
/// never leave the two out of step.
pub struct Adxl345<I2C> {
    i2c: I2C,
    address: u8,
    range: Range,
}

impl<I2C: I2cBus> Adxl345<I2C> {
    /// Create a driver at the default address
    ///
    /// No bus traffic happens until [`init`](Self::init).
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Create a driver at a specific address (see [`ALT_ADDRESS`])
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            range: Range::default(),
        }
    }

    /// Give back the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Bus address in use
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Last range the device accepted
    pub fn range(&self) -> Range {
        self.range
    }

    /// Active scale factor in g per LSB
    pub fn scale_factor(&self) -> f32 {
        self.range.scale_factor()
    }

    /// Start measuring at ±2 g
    pub fn init(&mut self) -> Result<(), Adxl345Error<I2C::Error>> {
        self.write(reg::POWER_CTL, POWER_CTL_MEASURE)?;
        self.set_range(Range::G2)
    }

    /// Select the measurement range
    ///
    /// The scale factor only changes if the write succeeded.
    pub fn set_range(&mut self, range: Range) -> Result<(), Adxl345Error<I2C::Error>> {
        self.write(reg::DATA_FORMAT, range.data_format())?;
        self.range = range;

        #[cfg(feature = "defmt")]
        defmt::debug!("adxl345: range {}", range);

        Ok(())
    }

    /// Select the output data rate
    pub fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Adxl345Error<I2C::Error>> {
        self.write(reg::BW_RATE, rate as u8)
    }

    /// Program the per-axis offset trims (15.6 mg per LSB)
    pub fn set_offsets(&mut self, x: i8, y: i8, z: i8) -> Result<(), Adxl345Error<I2C::Error>> {
        self.write(reg::OFSX, x as u8)?;
        self.write(reg::OFSY, y as u8)?;
        self.write(reg::OFSZ, z as u8)
    }

    /// Enter standby
    pub fn power_down(&mut self) -> Result<(), Adxl345Error<I2C::Error>> {
        self.write(reg::POWER_CTL, POWER_CTL_STANDBY)
    }

    /// Resume measuring
    pub fn power_up(&mut self) -> Result<(), Adxl345Error<I2C::Error>> {
        self.write(reg::POWER_CTL, POWER_CTL_MEASURE)
    }

    /// Read DEVID
    pub fn device_id(&mut self) -> Result<u8, Adxl345Error<I2C::Error>> {
        self.i2c
            .read_register(self.address, reg::DEVID)
            .map_err(Adxl345Error::Read)
    }

    /// Check that the device at our address is an ADXL345
    pub fn verify_device_id(&mut self) -> Result<(), Adxl345Error<I2C::Error>> {
        match self.device_id()? {
            DEVICE_ID => Ok(()),
            other => {
                #[cfg(feature = "defmt")]
                defmt::warn!("adxl345: unexpected device id {=u8:#x}", other);
                Err(Adxl345Error::WrongDevice(other))
            }
        }
    }

    /// Read one unscaled sample
    pub fn read_raw(&mut self) -> Result<RawSample, Adxl345Error<I2C::Error>> {
        let mut buf = [0u8; RawSample::LEN];
        self.i2c
            .read_registers(self.address, reg::DATAX0, &mut buf)
            .map_err(Adxl345Error::Read)?;
        Ok(RawSample::from_le_bytes(&buf))
    }

    /// Read one sample in g at the active range
    pub fn read(&mut self) -> Result<AccelSample, Adxl345Error<I2C::Error>> {
        let raw = self.read_raw()?;
        Ok(raw.scaled(self.scale_factor()))
    }

    fn write(&mut self, register: u8, value: u8) -> Result<(), Adxl345Error<I2C::Error>> {
        self.i2c
            .write_register(self.address, register, value)
            .map_err(Adxl345Error::Configuration)
    }
}

impl<I2C: I2cBus> Accelerometer for Adxl345<I2C> {
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        Adxl345::read_raw(self).map_err(SensorError::from)
    }

    fn scale_factor(&self) -> f32 {
        Adxl345::scale_factor(self)
    }
}
