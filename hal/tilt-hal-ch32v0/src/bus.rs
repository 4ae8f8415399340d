//! I2C1 bring-up
//!
//! Enables the GPIOC and I2C1 clocks, pulses the I2C1 reset, routes PC1 (SDA)
//! and PC2 (SCL) to the peripheral as open-drain outputs and programs the
//! bus clock. Must run once before the first transaction.

use tilt_hal::i2c::I2cConfig;

use crate::mmio::Mmio;
use crate::regs::{gpio, i2c, rcc};

/// Lowest peripheral clock the I2C block accepts, in Hz
const MIN_PCLK_HZ: u32 = 2_000_000;
/// Highest value representable in CTLR2.FREQ, in Hz
const MAX_PCLK_HZ: u32 = 63_000_000;
/// Upper bound of standard mode
const STANDARD_MODE_MAX_HZ: u32 = 100_000;
/// Smallest CCR accepted in standard mode
const STANDARD_MODE_MIN_CCR: u32 = 4;

/// Clock tree settings relevant to the I2C block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusClockConfig {
    /// APB1 peripheral clock feeding I2C1, in Hz
    pub pclk_hz: u32,
}

impl Default for BusClockConfig {
    fn default() -> Self {
        Self {
            pclk_hz: 24_000_000, // HSI without PLL
        }
    }
}

/// Rejected clock settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Peripheral clock outside 2..=63 MHz
    PeripheralClockOutOfRange(u32),
    /// Requested SCL frequency cannot be produced from the peripheral clock
    BusFrequencyUnreachable(u32),
}

/// CTLR2.FREQ value for a peripheral clock
pub fn ctlr2_freq(clocks: &BusClockConfig) -> Result<u16, ClockError> {
    if !(MIN_PCLK_HZ..=MAX_PCLK_HZ).contains(&clocks.pclk_hz) {
        return Err(ClockError::PeripheralClockOutOfRange(clocks.pclk_hz));
    }
    Ok((clocks.pclk_hz / 1_000_000) as u16 & i2c::CTLR2_FREQ_MASK)
}

/// CKCFGR value for the requested SCL frequency
///
/// Standard mode: `CCR = pclk / (2 * f)`.
/// Fast mode (duty 2:1): `CCR = pclk / (3 * f)` with F/S set.
pub fn ckcfgr(clocks: &BusClockConfig, frequency: u32) -> Result<u16, ClockError> {
    if frequency == 0 {
        return Err(ClockError::BusFrequencyUnreachable(frequency));
    }

    let (ccr, min, fast_bit) = if frequency <= STANDARD_MODE_MAX_HZ {
        (clocks.pclk_hz / (2 * frequency), STANDARD_MODE_MIN_CCR, 0)
    } else {
        (clocks.pclk_hz / frequency.saturating_mul(3), 1, i2c::CKCFGR_FS)
    };

    if ccr < min || ccr > i2c::CKCFGR_CCR_MASK as u32 {
        return Err(ClockError::BusFrequencyUnreachable(frequency));
    }

    Ok(ccr as u16 | fast_bit)
}

/// Configure clocks, pins and the I2C1 block, then enable the peripheral
///
/// Nothing is written unless both clock values are valid.
pub fn init_bus(
    rcc_regs: &Mmio,
    gpioc: &Mmio,
    i2c1: &Mmio,
    clocks: &BusClockConfig,
    config: &I2cConfig,
) -> Result<(), ClockError> {
    let freq = ctlr2_freq(clocks)?;
    let ccr = ckcfgr(clocks, config.frequency)?;

    rcc_regs.set_bits(rcc::APB1PCENR, rcc::APB1_I2C1);
    rcc_regs.set_bits(rcc::APB2PCENR, rcc::APB2_IOPCEN);

    rcc_regs.set_bits(rcc::APB1PRSTR, rcc::APB1_I2C1);
    rcc_regs.clear_bits(rcc::APB1PRSTR, rcc::APB1_I2C1);

    let pins_mask = (0xF << (4 * gpio::SDA_PIN)) | (0xF << (4 * gpio::SCL_PIN));
    let pins_mode = (gpio::MODE_OUT_10MHZ_AF_OD << (4 * gpio::SDA_PIN))
        | (gpio::MODE_OUT_10MHZ_AF_OD << (4 * gpio::SCL_PIN));
    gpioc.modify(gpio::CFGLR, |v| (v & !pins_mask) | pins_mode);

    i2c1.write(i2c::CTLR2, freq as u32);
    i2c1.write(i2c::CKCFGR, ccr as u32);
    i2c1.set_bits(i2c::CTLR1, i2c::CTLR1_PE as u32);

    #[cfg(feature = "defmt")]
    defmt::debug!(
        "i2c1: enabled, pclk={} Hz scl={} Hz ckcfgr={:#x}",
        clocks.pclk_hz,
        config.frequency,
        ccr
    );

    Ok(())
}
