//! UART serial output abstraction
//!
//! Diagnostics are written to a plain blocking byte sink.

/// UART transmitter
///
/// Blocking byte sink, typically a debug serial port.
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Write a UTF-8 string
    fn write_str_blocking(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_blocking(s.as_bytes())
    }
}
