//! Accelerometer drivers

pub mod adxl345;

pub use adxl345::{Adxl345, Adxl345Error, DataRate, Range};
