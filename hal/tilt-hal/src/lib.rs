//! Tilt Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by chip-specific HALs. Sensor drivers are written against these traits
//! only, so they can be exercised on the host with simulated buses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Drivers (tilt-drivers)                 │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tilt-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  tilt-hal-    │
//!             │    ch32v0     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cBus`] - Register-oriented I2C master operations
//! - [`uart::UartTx`] - Byte sink for diagnostics output

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use i2c::{I2cBus, I2cConfig};
pub use uart::UartTx;
