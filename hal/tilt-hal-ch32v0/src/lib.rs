//! CH32V003-specific HAL for the Tilt firmware
//!
//! This crate provides a polled I2C master for the CH32V003 I2C1 peripheral
//! and implements the [`tilt_hal::I2cBus`] trait on top of it. The chip has
//! no usable interrupt or DMA path for this firmware, so every bus phase is
//! a busy-wait on a status flag bounded by a countdown.
//!
//! # Modules
//!
//! - [`regs`] - Peripheral base addresses and register bit definitions
//! - [`mmio`] - Volatile register block access
//! - [`bus`] - Clock, pin and peripheral bring-up
//! - [`i2c`] - The polled transaction engine
//!
//! # Features
//!
//! - `defmt` - Enable debug formatting and bus fault logging

#![no_std]

pub mod bus;
pub mod i2c;
pub mod mmio;
pub mod regs;

pub use bus::{init_bus, BusClockConfig, ClockError};
pub use i2c::{I2cBusError, I2cRegisters, PolledI2c, WaitPoint};
pub use mmio::{I2c1, Mmio};

// Re-export shared types from tilt-hal
pub use tilt_hal::i2c::{I2cBus, I2cConfig};
