//! Sensor driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in tilt-core, written against the bus traits of tilt-hal:
//!
//! - Accelerometers (ADXL345 over I2C)
//! - Diagnostic text output of samples

#![no_std]
#![deny(unsafe_code)]

pub mod accel;
pub mod report;
