//! Accelerometer trait

use crate::convert::{AccelSample, RawSample};

/// Accelerometer error types
///
/// Bus-level detail is collapsed here; drivers keep it in their own error
/// types for callers that need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// A configuration register write failed
    Configuration,
    /// A sample read failed
    Read,
    /// The device at the bus address is not the expected part
    WrongDevice(u8),
}

/// Trait for 3-axis accelerometers
pub trait Accelerometer {
    /// Read one unscaled sample
    fn read_raw(&mut self) -> Result<RawSample, SensorError>;

    /// Current scale factor in g per LSB
    fn scale_factor(&self) -> f32;

    /// Read one sample in g
    fn read(&mut self) -> Result<AccelSample, SensorError> {
        let raw = self.read_raw()?;
        Ok(raw.scaled(self.scale_factor()))
    }
}
