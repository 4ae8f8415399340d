//! Volatile register block access
//!
//! The CH32V003 peripherals are driven through raw volatile accesses. All
//! registers are 32 bits wide on the bus; the I2C registers only use the low
//! 16 bits.

use core::ptr::{read_volatile, write_volatile};

use crate::i2c::I2cRegisters;
use crate::regs::i2c;

/// A memory-mapped register block
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Wrap a register block at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to a register block (or memory standing in for one)
    /// that is valid for 32-bit volatile reads and writes at every offset
    /// used through this handle, for as long as the handle lives. No other
    /// code may access the same block concurrently.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Read the register at byte `offset`
    #[inline(always)]
    pub fn read(&self, offset: usize) -> u32 {
        // SAFETY: validity of base + offset is the contract of `Mmio::new`.
        unsafe { read_volatile((self.base + offset) as *const u32) }
    }

    /// Write the register at byte `offset`
    #[inline(always)]
    pub fn write(&self, offset: usize, value: u32) {
        // SAFETY: validity of base + offset is the contract of `Mmio::new`.
        unsafe { write_volatile((self.base + offset) as *mut u32, value) }
    }

    /// Read-modify-write the register at byte `offset`
    #[inline(always)]
    pub fn modify(&self, offset: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    /// Set `bits` in the register at byte `offset`
    #[inline(always)]
    pub fn set_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v | bits);
    }

    /// Clear `bits` in the register at byte `offset`
    #[inline(always)]
    pub fn clear_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v & !bits);
    }
}

/// The I2C1 peripheral register block
#[derive(Debug)]
pub struct I2c1 {
    mmio: Mmio,
}

impl I2c1 {
    /// Drive the I2C register layout through an existing block
    pub fn from_mmio(mmio: Mmio) -> Self {
        Self { mmio }
    }

    /// Underlying register block
    pub fn mmio(&self) -> &Mmio {
        &self.mmio
    }
}

impl I2cRegisters for I2c1 {
    fn ctlr1(&mut self) -> u16 {
        self.mmio.read(i2c::CTLR1) as u16
    }

    fn set_ctlr1(&mut self, value: u16) {
        self.mmio.write(i2c::CTLR1, value as u32);
    }

    fn star1(&mut self) -> u16 {
        self.mmio.read(i2c::STAR1) as u16
    }

    fn set_star1(&mut self, value: u16) {
        self.mmio.write(i2c::STAR1, value as u32);
    }

    fn star2(&mut self) -> u16 {
        self.mmio.read(i2c::STAR2) as u16
    }

    fn write_datar(&mut self, byte: u8) {
        self.mmio.write(i2c::DATAR, byte as u32);
    }

    fn read_datar(&mut self) -> u8 {
        self.mmio.read(i2c::DATAR) as u8
    }
}
