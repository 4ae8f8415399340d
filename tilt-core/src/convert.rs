//! Raw sample decoding and scaling
//!
//! Sensors report each axis as a signed 16-bit count. Multiplying by the
//! range-dependent scale factor (g per LSB) gives acceleration in g.
//! Display code quantizes back to hundredths of a g in `i32`, which is wide
//! enough for the largest range without overflow.

/// Scale a raw count to physical units
#[inline]
pub fn scale(raw: i16, factor: f32) -> f32 {
    raw as f32 * factor
}

/// Quantize a value in g to hundredths of a g, truncating toward zero
///
/// Out-of-range values and infinities saturate at the `i32` limits instead
/// of wrapping. NaN maps to 0.
#[inline]
pub fn to_centi_g(g: f32) -> i32 {
    (g * 100.0) as i32
}

/// Unscaled 3-axis sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl RawSample {
    /// Bytes per sample on the wire
    pub const LEN: usize = 6;

    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Decode `x_lo, x_hi, y_lo, y_hi, z_lo, z_hi`
    pub fn from_le_bytes(bytes: &[u8; Self::LEN]) -> Self {
        Self {
            x: i16::from_le_bytes([bytes[0], bytes[1]]),
            y: i16::from_le_bytes([bytes[2], bytes[3]]),
            z: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    /// Convert to g with the given scale factor
    pub fn scaled(&self, factor: f32) -> AccelSample {
        AccelSample {
            x: scale(self.x, factor),
            y: scale(self.y, factor),
            z: scale(self.z, factor),
        }
    }
}

/// 3-axis acceleration in g
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelSample {
    /// Axes in hundredths of a g, `[x, y, z]`
    pub fn to_centi_g(&self) -> [i32; 3] {
        [to_centi_g(self.x), to_centi_g(self.y), to_centi_g(self.z)]
    }
}
