//! Board-agnostic core logic for the Tilt sensor firmware
//!
//! This crate contains everything that does not touch a bus:
//!
//! - Sensor abstraction traits (accelerometer)
//! - Raw and physical sample types
//! - Raw-to-physical scaling and fixed-point quantization

#![no_std]
#![deny(unsafe_code)]

pub mod convert;
pub mod traits;

pub use convert::{AccelSample, RawSample};
