//! CH32V003 register map
//!
//! Only the registers touched by the I2C bring-up and the polled engine are
//! listed. Offsets are in bytes from the peripheral base.

/// Peripheral base addresses
pub mod base {
    pub const RCC: usize = 0x4002_1000;
    pub const GPIOC: usize = 0x4001_1000;
    pub const I2C1: usize = 0x4000_5400;
}

/// Reset and clock control
pub mod rcc {
    /// APB1 peripheral reset
    pub const APB1PRSTR: usize = 0x10;
    /// APB2 peripheral clock enable
    pub const APB2PCENR: usize = 0x18;
    /// APB1 peripheral clock enable
    pub const APB1PCENR: usize = 0x1C;

    /// GPIOC clock (APB2)
    pub const APB2_IOPCEN: u32 = 1 << 4;
    /// I2C1 clock and reset (APB1)
    pub const APB1_I2C1: u32 = 1 << 21;
}

/// General purpose I/O
pub mod gpio {
    /// Port configuration, pins 0-7 (4 bits per pin)
    pub const CFGLR: usize = 0x00;

    /// 10 MHz output, alternate function, open drain
    pub const MODE_OUT_10MHZ_AF_OD: u32 = 0b1101;

    /// I2C1 SDA on PC1
    pub const SDA_PIN: u32 = 1;
    /// I2C1 SCL on PC2
    pub const SCL_PIN: u32 = 2;
}

/// I2C peripheral
pub mod i2c {
    pub const CTLR1: usize = 0x00;
    pub const CTLR2: usize = 0x04;
    pub const DATAR: usize = 0x10;
    pub const STAR1: usize = 0x14;
    pub const STAR2: usize = 0x18;
    pub const CKCFGR: usize = 0x1C;

    // CTLR1
    /// Peripheral enable
    pub const CTLR1_PE: u16 = 1 << 0;
    /// Generate START
    pub const CTLR1_START: u16 = 1 << 8;
    /// Generate STOP
    pub const CTLR1_STOP: u16 = 1 << 9;
    /// Acknowledge received bytes
    pub const CTLR1_ACK: u16 = 1 << 10;

    // CTLR2
    /// Peripheral input clock in MHz
    pub const CTLR2_FREQ_MASK: u16 = 0x3F;

    // STAR1
    /// START generated
    pub const STAR1_SB: u16 = 1 << 0;
    /// Address sent and acknowledged
    pub const STAR1_ADDR: u16 = 1 << 1;
    /// Byte transfer finished
    pub const STAR1_BTF: u16 = 1 << 2;
    /// Receive register not empty
    pub const STAR1_RXNE: u16 = 1 << 6;
    /// Transmit register empty
    pub const STAR1_TXE: u16 = 1 << 7;
    /// Acknowledge failure
    pub const STAR1_AF: u16 = 1 << 10;

    // STAR2
    /// Bus busy
    pub const STAR2_BUSY: u16 = 1 << 1;

    // CKCFGR
    /// Clock control value
    pub const CKCFGR_CCR_MASK: u16 = 0x0FFF;
    /// Fast mode select
    pub const CKCFGR_FS: u16 = 1 << 15;
}
