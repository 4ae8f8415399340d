//! Diagnostic text output
//!
//! Formats samples for a serial console as fixed-point hundredths of a g:
//!
//! ```text
//! Acceleration:
//! X: 0.00 g
//! Y: -0.06 g
//! Z: 1.02 g
//!
//! ```
//!
//! Values are truncated toward zero, and negative values keep their sign even
//! when the integer part is 0.

use core::fmt::Write;

use heapless::String;
use tilt_core::convert::{to_centi_g, AccelSample};
use tilt_core::traits::{Accelerometer, SensorError};
use tilt_hal::uart::UartTx;

/// Longest formatted line ("X: -21474836.48 g\r\n" plus headroom)
pub const LINE_CAPACITY: usize = 32;

const HEADER: &str = "Acceleration:\r\n";
const FOOTER: &str = "\r\n";

/// Report errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportError<E> {
    /// The sensor read failed; nothing was written
    Sensor(SensorError),
    /// A line did not fit in [`LINE_CAPACITY`]
    Format,
    /// The sink rejected the output
    Sink(E),
}

/// Format one axis line, e.g. `"Z: 1.02 g\r\n"`
pub fn format_axis(label: char, centi_g: i32) -> Result<String<LINE_CAPACITY>, core::fmt::Error> {
    let sign = if centi_g < 0 { "-" } else { "" };
    let magnitude = centi_g.unsigned_abs();

    let mut line = String::new();
    write!(
        line,
        "{}: {}{}.{:02} g\r\n",
        label,
        sign,
        magnitude / 100,
        magnitude % 100
    )?;
    Ok(line)
}

/// Write a full report block for one sample
pub fn write_sample<W: UartTx>(sink: &mut W, sample: &AccelSample) -> Result<(), ReportError<W::Error>> {
    sink.write_str_blocking(HEADER).map_err(ReportError::Sink)?;

    for (label, value) in ['X', 'Y', 'Z'].into_iter().zip([sample.x, sample.y, sample.z]) {
        let line = format_axis(label, to_centi_g(value)).map_err(|_| ReportError::Format)?;
        sink.write_str_blocking(&line).map_err(ReportError::Sink)?;
    }

    sink.write_str_blocking(FOOTER).map_err(ReportError::Sink)?;
    sink.flush().map_err(ReportError::Sink)
}

/// Read one sample and report it
///
/// A failed read writes nothing and is handed back to the caller.
pub fn report<A, W>(accel: &mut A, sink: &mut W) -> Result<AccelSample, ReportError<W::Error>>
where
    A: Accelerometer,
    W: UartTx,
{
    let sample = accel.read().map_err(ReportError::Sensor)?;
    write_sample(sink, &sample)?;
    Ok(sample)
}
