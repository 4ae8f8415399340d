//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and sensor driver implementations.

pub mod accel;

pub use accel::{Accelerometer, SensorError};
