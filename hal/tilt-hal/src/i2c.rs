//! I2C bus abstractions
//!
//! Provides traits for register-oriented I2C master operations that can be
//! implemented by chip-specific HALs.

/// I2C bus master
///
/// Register-level access to a device: every transaction addresses one
/// device and one register offset inside it.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write a single byte to a device register
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `register` - Register offset inside the device
    /// * `value` - Byte to store
    fn write_register(&mut self, address: u8, register: u8, value: u8)
        -> Result<(), Self::Error>;

    /// Burst-read consecutive registers starting at `register`
    ///
    /// On `Ok` the whole buffer has been filled. On `Err` the buffer
    /// contents must not be used.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `register` - First register offset to read
    /// * `buf` - Buffer to read into
    fn read_registers(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Read a single register
    fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read_registers(address, register, &mut buf)?;
        Ok(buf[0])
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Status polls allowed at each wait-point before giving up
    ///
    /// The minimum is 1: a wait-point always polls once, so 0 behaves as 1.
    pub timeout_polls: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::FAST
    }
}

impl I2cConfig {
    /// Polls per wait-point used by the default configurations
    pub const DEFAULT_TIMEOUT_POLLS: u32 = 10_000;

    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        timeout_polls: Self::DEFAULT_TIMEOUT_POLLS,
    };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self {
        frequency: 400_000,
        timeout_polls: Self::DEFAULT_TIMEOUT_POLLS,
    };

    /// Same configuration with a different wait-point budget
    pub const fn with_timeout_polls(self, timeout_polls: u32) -> Self {
        Self {
            timeout_polls,
            ..self
        }
    }
}
