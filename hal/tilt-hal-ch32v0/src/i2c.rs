//! Polled I2C master
//!
//! Every transaction is a fixed sequence of register writes and wait-points.
//! A wait-point spins on one status flag with its own countdown; running out
//! of polls fails the whole transaction.
//!
//! # Write
//!
//! ```text
//! IDLE → START → SB → addr|W → ADDR → reg → TXE → data → BTF → STOP
//! ```
//!
//! # Burst read
//!
//! ```text
//! write(reg, 0) → settle → START → SB → addr|R → ADDR → {ACK, RXNE}* → NACK, RXNE → STOP
//! ```
//!
//! A timeout returns immediately without generating STOP; the bus is left
//! as the fault found it. An acknowledge failure clears AF and generates STOP.
//! Nothing is latched between transactions and nothing is retried.

use embedded_hal::delay::DelayNs;
use tilt_hal::i2c::{I2cBus, I2cConfig};

use crate::bus::{self, BusClockConfig, ClockError};
use crate::mmio::{I2c1, Mmio};
use crate::regs::{base, i2c};

/// Time the device needs between the register pointer write and the read
/// restart, in milliseconds.
///
/// Empirical settle time for the ADXL345 on this bus; not a tuning knob.
pub const REGISTER_SELECT_SETTLE_MS: u32 = 1;

/// Largest valid 7-bit address
const MAX_ADDRESS: u8 = 0x7F;

/// Register-level access to an I2C peripheral
///
/// Implemented by [`I2c1`] for the real block and by fakes in tests.
pub trait I2cRegisters {
    /// Read control register 1
    fn ctlr1(&mut self) -> u16;
    /// Write control register 1
    fn set_ctlr1(&mut self, value: u16);
    /// Read status register 1
    fn star1(&mut self) -> u16;
    /// Write status register 1 (error flags are cleared by writing 0)
    fn set_star1(&mut self, value: u16);
    /// Read status register 2
    fn star2(&mut self) -> u16;
    /// Write the data register
    fn write_datar(&mut self, byte: u8);
    /// Read the data register
    fn read_datar(&mut self) -> u8;
}

/// Status flag a transaction is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPoint {
    /// STAR2.BUSY clear
    BusIdle,
    /// STAR1.SB set after requesting START
    StartGenerated,
    /// STAR1.ADDR set after sending the address byte
    AddressAcked,
    /// STAR1.TXE set, data register ready for the next byte
    TxEmpty,
    /// STAR1.BTF set, last byte fully shifted out
    ByteTransferred,
    /// STAR1.RXNE set, a received byte is waiting
    RxNotEmpty,
}

/// Outcome of a single poll of a wait-point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Poll {
    Ready,
    Pending,
    Nack,
}

impl WaitPoint {
    /// Whether an acknowledge failure can end this wait
    fn watches_ack(self) -> bool {
        matches!(
            self,
            WaitPoint::AddressAcked | WaitPoint::TxEmpty | WaitPoint::ByteTransferred
        )
    }

    /// STAR1 flag that satisfies this wait
    fn star1_flag(self) -> u16 {
        match self {
            WaitPoint::BusIdle => 0,
            WaitPoint::StartGenerated => i2c::STAR1_SB,
            WaitPoint::AddressAcked => i2c::STAR1_ADDR,
            WaitPoint::TxEmpty => i2c::STAR1_TXE,
            WaitPoint::ByteTransferred => i2c::STAR1_BTF,
            WaitPoint::RxNotEmpty => i2c::STAR1_RXNE,
        }
    }

    fn poll<R: I2cRegisters>(self, regs: &mut R) -> Poll {
        if self == WaitPoint::BusIdle {
            return if regs.star2() & i2c::STAR2_BUSY == 0 {
                Poll::Ready
            } else {
                Poll::Pending
            };
        }

        let star1 = regs.star1();
        if self.watches_ack() && star1 & i2c::STAR1_AF != 0 {
            Poll::Nack
        } else if star1 & self.star1_flag() != 0 {
            Poll::Ready
        } else {
            Poll::Pending
        }
    }
}

/// Error from I2C operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cBusError {
    /// A wait-point ran out of polls
    Timeout(WaitPoint),
    /// The device did not acknowledge its address or a byte
    Nack,
    /// Address does not fit in 7 bits
    InvalidAddress(u8),
}

/// Transfer direction, carried in bit 0 of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Write = 0,
    Read = 1,
}

/// Polled I2C master
pub struct PolledI2c<R, D> {
    regs: R,
    delay: D,
    config: I2cConfig,
}

impl<D: DelayNs> PolledI2c<I2c1, D> {
    /// Bring up I2C1 and take it as a polled master
    ///
    /// # Safety
    ///
    /// Must only be called once, on a CH32V003, before anything else touches
    /// RCC, GPIOC or I2C1.
    pub unsafe fn take_i2c1(
        delay: D,
        clocks: &BusClockConfig,
        config: I2cConfig,
    ) -> Result<Self, ClockError> {
        let rcc = Mmio::new(base::RCC);
        let gpioc = Mmio::new(base::GPIOC);
        let i2c1 = Mmio::new(base::I2C1);

        bus::init_bus(&rcc, &gpioc, &i2c1, clocks, &config)?;

        Ok(Self::new(I2c1::from_mmio(i2c1), delay, config))
    }
}

impl<R: I2cRegisters, D: DelayNs> PolledI2c<R, D> {
    /// Create a master over an already initialized peripheral
    pub fn new(regs: R, delay: D, config: I2cConfig) -> Self {
        Self {
            regs,
            delay,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &I2cConfig {
        &self.config
    }

    /// Give back the peripheral and the delay provider
    pub fn release(self) -> (R, D) {
        (self.regs, self.delay)
    }

    /// Spin until `point` is satisfied or its countdown expires
    ///
    /// The flag is always polled at least once, so a budget of 0 acts as 1.
    fn wait_for(&mut self, point: WaitPoint) -> Result<(), I2cBusError> {
        let mut remaining = self.config.timeout_polls;
        loop {
            match point.poll(&mut self.regs) {
                Poll::Ready => return Ok(()),
                Poll::Nack => {
                    self.abort_nack();
                    #[cfg(feature = "defmt")]
                    defmt::warn!("i2c: nack while waiting for {}", point);
                    return Err(I2cBusError::Nack);
                }
                Poll::Pending => {}
            }

            remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                #[cfg(feature = "defmt")]
                defmt::warn!("i2c: timed out waiting for {}", point);
                return Err(I2cBusError::Timeout(point));
            }
        }
    }

    /// Clear AF and release the bus after the device refused a byte
    fn abort_nack(&mut self) {
        let star1 = self.regs.star1();
        self.regs.set_star1(star1 & !i2c::STAR1_AF);
        self.stop();
    }

    fn modify_ctlr1(&mut self, f: impl FnOnce(u16) -> u16) {
        let value = self.regs.ctlr1();
        self.regs.set_ctlr1(f(value));
    }

    fn start(&mut self) -> Result<(), I2cBusError> {
        self.modify_ctlr1(|v| v | i2c::CTLR1_START);
        self.wait_for(WaitPoint::StartGenerated)
    }

    fn stop(&mut self) {
        self.modify_ctlr1(|v| v | i2c::CTLR1_STOP);
    }

    fn set_ack(&mut self, ack: bool) {
        if ack {
            self.modify_ctlr1(|v| v | i2c::CTLR1_ACK);
        } else {
            self.modify_ctlr1(|v| v & !i2c::CTLR1_ACK);
        }
    }

    /// Send the address byte and clear ADDR once acknowledged
    fn send_address(&mut self, address: u8, direction: Direction) -> Result<(), I2cBusError> {
        self.regs.write_datar((address << 1) | direction as u8);
        self.wait_for(WaitPoint::AddressAcked)?;
        // ADDR clears on the STAR1 read followed by this STAR2 read
        let _ = self.regs.star2();
        Ok(())
    }

    fn write_frame(&mut self, address: u8, register: u8, value: u8) -> Result<(), I2cBusError> {
        self.wait_for(WaitPoint::BusIdle)?;
        self.start()?;
        self.send_address(address, Direction::Write)?;

        self.regs.write_datar(register);
        self.wait_for(WaitPoint::TxEmpty)?;

        self.regs.write_datar(value);
        self.wait_for(WaitPoint::ByteTransferred)?;

        self.stop();
        Ok(())
    }

    fn read_frame(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), I2cBusError> {
        // Latch the register pointer; the payload byte is a dummy
        self.write_frame(address, register, 0)?;
        self.delay.delay_ms(REGISTER_SELECT_SETTLE_MS);

        self.start()?;
        self.send_address(address, Direction::Read)?;

        let last = buf.len() - 1;
        for (i, byte) in buf.iter_mut().enumerate() {
            self.set_ack(i != last);
            self.wait_for(WaitPoint::RxNotEmpty)?;
            *byte = self.regs.read_datar();
        }

        self.stop();
        Ok(())
    }

    fn check_address(address: u8) -> Result<(), I2cBusError> {
        if address > MAX_ADDRESS {
            return Err(I2cBusError::InvalidAddress(address));
        }
        Ok(())
    }
}

impl<R: I2cRegisters, D: DelayNs> I2cBus for PolledI2c<R, D> {
    type Error = I2cBusError;

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), I2cBusError> {
        Self::check_address(address)?;
        self.write_frame(address, register, value)
    }

    /// An empty `buf` completes immediately without touching the bus.
    /// On failure `buf` is zeroed.
    fn read_registers(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), I2cBusError> {
        Self::check_address(address)?;
        if buf.is_empty() {
            return Ok(());
        }

        match self.read_frame(address, register, buf) {
            Ok(()) => Ok(()),
            Err(e) => {
                buf.fill(0);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    /// Bus-level event observed by the fake peripheral
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Start,
        Address(u8),
        Data(u8),
        /// Byte handed to the master, with the ACK bit that was set for it
        Received(u8, bool),
        Stop,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Idle,
        AddressPending,
        Addressed,
        Register,
        Payload,
        Reading,
    }

    /// Never satisfy `point` during the START numbered `start` (0-based).
    /// For `BusIdle` the bus stays busy until that START would be issued.
    #[derive(Debug, Clone, Copy)]
    struct Stall {
        point: WaitPoint,
        start: usize,
    }

    /// Peripheral plus a register-mapped device behind it
    struct FakeRegisters {
        ctlr1: u16,
        af: bool,
        sb: bool,
        addr: bool,
        txe: bool,
        btf: bool,
        phase: Phase,
        reading: bool,
        starts: usize,
        stall: Option<Stall>,
        nack_address: bool,
        /// Byte the device refuses after its address, raising AF instead of TXE/BTF
        nack_data: Option<u8>,
        device: u8,
        regs: [u8; 64],
        pointer: u8,
        events: Vec<Event>,
        star1_reads: u32,
        star2_reads: u32,
    }

    impl FakeRegisters {
        fn new(device: u8) -> Self {
            Self {
                ctlr1: i2c::CTLR1_PE,
                af: false,
                sb: false,
                addr: false,
                txe: false,
                btf: false,
                phase: Phase::Idle,
                reading: false,
                starts: 0,
                stall: None,
                nack_address: false,
                nack_data: None,
                device,
                regs: [0; 64],
                pointer: 0,
                events: Vec::new(),
                star1_reads: 0,
                star2_reads: 0,
            }
        }

        fn stalled(&self, point: WaitPoint) -> bool {
            match self.stall {
                Some(stall) if stall.point == point => {
                    if point == WaitPoint::BusIdle {
                        self.starts == stall.start
                    } else {
                        self.starts == stall.start + 1
                    }
                }
                _ => false,
            }
        }

        /// Registers the device ignores writes to (ADXL345 layout)
        fn writable(register: u8) -> bool {
            !matches!(register, 0x00 | 0x30 | 0x32..=0x37 | 0x39)
        }

        fn flag(&self, point: WaitPoint, set: bool) -> u16 {
            if set && !self.stalled(point) {
                point.star1_flag()
            } else {
                0
            }
        }
    }

    impl I2cRegisters for FakeRegisters {
        fn ctlr1(&mut self) -> u16 {
            self.ctlr1
        }

        fn set_ctlr1(&mut self, value: u16) {
            // START and STOP are cleared by hardware once acted upon
            if value & i2c::CTLR1_START != 0 {
                self.events.push(Event::Start);
                self.starts += 1;
                self.sb = true;
                self.phase = Phase::AddressPending;
            }
            if value & i2c::CTLR1_STOP != 0 {
                self.events.push(Event::Stop);
                self.phase = Phase::Idle;
                self.txe = false;
                self.btf = false;
            }
            self.ctlr1 = value & !(i2c::CTLR1_START | i2c::CTLR1_STOP);
        }

        fn star1(&mut self) -> u16 {
            self.star1_reads += 1;
            let mut value = self.flag(WaitPoint::StartGenerated, self.sb)
                | self.flag(WaitPoint::AddressAcked, self.addr)
                | self.flag(WaitPoint::TxEmpty, self.txe)
                | self.flag(WaitPoint::ByteTransferred, self.btf)
                | self.flag(WaitPoint::RxNotEmpty, self.phase == Phase::Reading);
            if self.af {
                value |= i2c::STAR1_AF;
            }
            value
        }

        fn set_star1(&mut self, value: u16) {
            if value & i2c::STAR1_AF == 0 {
                self.af = false;
            }
        }

        fn star2(&mut self) -> u16 {
            self.star2_reads += 1;
            if self.addr {
                self.addr = false;
                self.phase = if self.reading {
                    Phase::Reading
                } else {
                    Phase::Addressed
                };
            }
            if self.stalled(WaitPoint::BusIdle) {
                i2c::STAR2_BUSY
            } else {
                0
            }
        }

        fn write_datar(&mut self, byte: u8) {
            match self.phase {
                Phase::AddressPending => {
                    self.events.push(Event::Address(byte));
                    self.sb = false;
                    self.reading = byte & 1 == 1;
                    if byte >> 1 == self.device && !self.nack_address {
                        self.addr = true;
                    } else {
                        self.af = true;
                    }
                }
                Phase::Addressed | Phase::Register | Phase::Payload
                    if self.nack_data == Some(byte) =>
                {
                    self.events.push(Event::Data(byte));
                    self.af = true;
                }
                Phase::Addressed => {
                    self.events.push(Event::Data(byte));
                    self.pointer = byte;
                    self.txe = true;
                    self.phase = Phase::Register;
                }
                Phase::Register | Phase::Payload => {
                    self.events.push(Event::Data(byte));
                    if Self::writable(self.pointer) {
                        self.regs[self.pointer as usize] = byte;
                    }
                    self.btf = true;
                    self.phase = Phase::Payload;
                }
                Phase::Idle | Phase::Reading => {}
            }
        }

        fn read_datar(&mut self) -> u8 {
            let byte = self.regs[self.pointer as usize];
            let ack = self.ctlr1 & i2c::CTLR1_ACK != 0;
            self.events.push(Event::Received(byte, ack));
            self.pointer = self.pointer.wrapping_add(1);
            byte
        }
    }

    /// Delay provider that only records what was asked of it
    #[derive(Default)]
    struct RecordingDelay {
        ms: Vec<u32>,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_ms(&mut self, ms: u32) {
            self.ms.push(ms);
        }
    }

    const DEVICE: u8 = 0x53;
    const POLLS: u32 = 50;

    fn master(regs: FakeRegisters) -> PolledI2c<FakeRegisters, RecordingDelay> {
        PolledI2c::new(
            regs,
            RecordingDelay::default(),
            I2cConfig::FAST.with_timeout_polls(POLLS),
        )
    }

    fn stalled_at(point: WaitPoint, start: usize) -> FakeRegisters {
        let mut regs = FakeRegisters::new(DEVICE);
        regs.stall = Some(Stall { point, start });
        regs
    }

    #[test]
    fn test_write_register_sequence() {
        let mut bus = master(FakeRegisters::new(DEVICE));

        bus.write_register(DEVICE, 0x2D, 0x08).unwrap();

        let (regs, delay) = bus.release();
        assert_eq!(
            regs.events,
            [
                Event::Start,
                Event::Address(0xA6),
                Event::Data(0x2D),
                Event::Data(0x08),
                Event::Stop,
            ]
        );
        assert_eq!(regs.regs[0x2D], 0x08);
        assert!(delay.ms.is_empty());
    }

    #[test]
    fn test_read_registers_sequence() {
        let mut regs = FakeRegisters::new(DEVICE);
        regs.regs[0x32..0x38].copy_from_slice(&[0x10, 0x00, 0x20, 0x00, 0x30, 0x00]);
        let mut bus = master(regs);

        let mut buf = [0u8; 6];
        bus.read_registers(DEVICE, 0x32, &mut buf).unwrap();
        assert_eq!(buf, [0x10, 0x00, 0x20, 0x00, 0x30, 0x00]);

        let (regs, delay) = bus.release();
        assert_eq!(
            regs.events,
            [
                Event::Start,
                Event::Address(0xA6),
                Event::Data(0x32),
                Event::Data(0x00),
                Event::Stop,
                Event::Start,
                Event::Address(0xA7),
                Event::Received(0x10, true),
                Event::Received(0x00, true),
                Event::Received(0x20, true),
                Event::Received(0x00, true),
                Event::Received(0x30, true),
                Event::Received(0x00, false),
                Event::Stop,
            ]
        );
        assert_eq!(delay.ms, [REGISTER_SELECT_SETTLE_MS]);
    }

    #[test]
    fn test_single_byte_read_is_nacked() {
        let mut regs = FakeRegisters::new(DEVICE);
        regs.regs[0x00] = 0xE5;
        let mut bus = master(regs);

        assert_eq!(bus.read_register(DEVICE, 0x00), Ok(0xE5));

        let (regs, _) = bus.release();
        assert_eq!(
            &regs.events[regs.events.len() - 2..],
            &[Event::Received(0xE5, false), Event::Stop]
        );
    }

    #[test]
    fn test_empty_read_is_a_no_op() {
        let mut bus = master(FakeRegisters::new(DEVICE));

        let mut buf = [0u8; 0];
        assert_eq!(bus.read_registers(DEVICE, 0x32, &mut buf), Ok(()));

        let (regs, delay) = bus.release();
        assert!(regs.events.is_empty());
        assert_eq!(regs.star1_reads + regs.star2_reads, 0);
        assert!(delay.ms.is_empty());
    }

    #[test]
    fn test_invalid_address_rejected_before_bus_activity() {
        let mut bus = master(FakeRegisters::new(DEVICE));

        assert_eq!(
            bus.write_register(0x80, 0x2D, 0x08),
            Err(I2cBusError::InvalidAddress(0x80))
        );
        let mut buf = [0u8; 2];
        assert_eq!(
            bus.read_registers(0xA6, 0x32, &mut buf),
            Err(I2cBusError::InvalidAddress(0xA6))
        );

        let (regs, _) = bus.release();
        assert!(regs.events.is_empty());
    }

    #[test]
    fn test_write_timeout_at_every_wait_point() {
        for point in [
            WaitPoint::BusIdle,
            WaitPoint::StartGenerated,
            WaitPoint::AddressAcked,
            WaitPoint::TxEmpty,
            WaitPoint::ByteTransferred,
        ] {
            let mut bus = master(stalled_at(point, 0));

            assert_eq!(
                bus.write_register(DEVICE, 0x31, 0x01),
                Err(I2cBusError::Timeout(point)),
                "stalled at {:?}",
                point
            );

            let (regs, _) = bus.release();
            assert!(
                !regs.events.contains(&Event::Stop),
                "no STOP after timeout at {:?}",
                point
            );
        }
    }

    #[test]
    fn test_timeout_is_bounded_by_countdown() {
        let mut bus = master(stalled_at(WaitPoint::StartGenerated, 0));
        let _ = bus.write_register(DEVICE, 0x31, 0x01);
        let (regs, _) = bus.release();
        assert_eq!(regs.star1_reads, POLLS);

        let mut bus = master(stalled_at(WaitPoint::BusIdle, 0));
        let _ = bus.write_register(DEVICE, 0x31, 0x01);
        let (regs, _) = bus.release();
        assert_eq!(regs.star2_reads, POLLS);
        assert_eq!(regs.star1_reads, 0);
    }

    #[test]
    fn test_read_timeout_is_bounded_by_countdown() {
        let mut regs = FakeRegisters::new(DEVICE);
        regs.regs[0x32] = 0x11;
        let mut bus = master(regs);
        let mut buf = [0u8; 1];
        bus.read_registers(DEVICE, 0x32, &mut buf).unwrap();
        let (regs, _) = bus.release();
        // One STAR1 poll per wait-point on the clean path, RXNE included
        let clean_polls = regs.star1_reads;

        let mut bus = master(stalled_at(WaitPoint::RxNotEmpty, 1));
        assert_eq!(
            bus.read_registers(DEVICE, 0x32, &mut buf),
            Err(I2cBusError::Timeout(WaitPoint::RxNotEmpty))
        );
        let (regs, _) = bus.release();
        assert_eq!(regs.star1_reads, clean_polls - 1 + POLLS);
    }

    #[test]
    fn test_zero_timeout_still_polls_once() {
        let mut bus = PolledI2c::new(
            stalled_at(WaitPoint::StartGenerated, 0),
            RecordingDelay::default(),
            I2cConfig::FAST.with_timeout_polls(0),
        );

        assert_eq!(
            bus.write_register(DEVICE, 0x31, 0x01),
            Err(I2cBusError::Timeout(WaitPoint::StartGenerated))
        );

        let (regs, _) = bus.release();
        assert_eq!(regs.star1_reads, 1);
    }

    #[test]
    fn test_read_timeout_at_every_wait_point() {
        // START 0 selects the register, START 1 reads it back
        for (point, start) in [
            (WaitPoint::BusIdle, 0),
            (WaitPoint::StartGenerated, 0),
            (WaitPoint::TxEmpty, 0),
            (WaitPoint::ByteTransferred, 0),
            (WaitPoint::StartGenerated, 1),
            (WaitPoint::AddressAcked, 1),
            (WaitPoint::RxNotEmpty, 1),
        ] {
            let mut regs = FakeRegisters::new(DEVICE);
            regs.regs[0x32..0x38].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
            regs.stall = Some(Stall { point, start });
            let mut bus = master(regs);

            let mut buf = [0xAAu8; 6];
            assert_eq!(
                bus.read_registers(DEVICE, 0x32, &mut buf),
                Err(I2cBusError::Timeout(point)),
                "stalled at {:?} during start {}",
                point,
                start
            );
            assert_eq!(buf, [0; 6], "partial data left after {:?}", point);
        }
    }

    #[test]
    fn test_address_nack_releases_bus() {
        let mut bus = master(FakeRegisters::new(DEVICE));

        assert_eq!(bus.write_register(0x1D, 0x2D, 0x08), Err(I2cBusError::Nack));

        let (regs, _) = bus.release();
        assert_eq!(
            regs.events,
            [Event::Start, Event::Address(0x3A), Event::Stop]
        );
        assert!(!regs.af, "AF must be cleared");
    }

    #[test]
    fn test_data_nack_releases_bus() {
        // Refused register byte, caught at TXE
        let mut regs = FakeRegisters::new(DEVICE);
        regs.nack_data = Some(0x31);
        let mut bus = master(regs);

        assert_eq!(bus.write_register(DEVICE, 0x31, 0x01), Err(I2cBusError::Nack));

        let (regs, _) = bus.release();
        assert_eq!(
            regs.events,
            [Event::Start, Event::Address(0xA6), Event::Data(0x31), Event::Stop]
        );
        assert!(!regs.af, "AF must be cleared");

        // Refused payload byte, caught at BTF
        let mut regs = FakeRegisters::new(DEVICE);
        regs.nack_data = Some(0x01);
        let mut bus = master(regs);

        assert_eq!(bus.write_register(DEVICE, 0x31, 0x01), Err(I2cBusError::Nack));

        let (regs, _) = bus.release();
        assert_eq!(
            regs.events,
            [
                Event::Start,
                Event::Address(0xA6),
                Event::Data(0x31),
                Event::Data(0x01),
                Event::Stop,
            ]
        );
        assert!(!regs.af, "AF must be cleared");
        assert_eq!(regs.regs[0x31], 0);
    }

    #[test]
    fn test_register_select_nack_clears_buffer() {
        let mut regs = FakeRegisters::new(DEVICE);
        regs.regs[0x32..0x38].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        regs.nack_data = Some(0x32);
        let mut bus = master(regs);

        let mut buf = [0xFFu8; 6];
        assert_eq!(
            bus.read_registers(DEVICE, 0x32, &mut buf),
            Err(I2cBusError::Nack)
        );
        assert_eq!(buf, [0; 6]);

        let (regs, delay) = bus.release();
        assert_eq!(
            regs.events,
            [Event::Start, Event::Address(0xA6), Event::Data(0x32), Event::Stop]
        );
        assert!(delay.ms.is_empty(), "no restart after a refused register byte");
    }

    #[test]
    fn test_read_nack_reports_failure_and_clears_buffer() {
        let mut regs = FakeRegisters::new(DEVICE);
        regs.nack_address = true;
        let mut bus = master(regs);

        let mut buf = [0xFFu8; 6];
        assert_eq!(
            bus.read_registers(DEVICE, 0x32, &mut buf),
            Err(I2cBusError::Nack)
        );
        assert_eq!(buf, [0; 6]);
    }

    #[test]
    fn test_failure_does_not_latch() {
        let mut bus = master(stalled_at(WaitPoint::TxEmpty, 0));

        assert_eq!(
            bus.write_register(DEVICE, 0x31, 0x01),
            Err(I2cBusError::Timeout(WaitPoint::TxEmpty))
        );
        // The stall only covered the first START
        assert_eq!(bus.write_register(DEVICE, 0x31, 0x02), Ok(()));

        let (regs, _) = bus.release();
        assert_eq!(regs.regs[0x31], 0x02);
    }

    #[test]
    fn test_read_only_registers_survive_pointer_write() {
        let mut regs = FakeRegisters::new(DEVICE);
        regs.regs[0x36] = 0x7F;
        let mut bus = master(regs);

        let mut buf = [0u8; 1];
        bus.read_registers(DEVICE, 0x36, &mut buf).unwrap();
        assert_eq!(buf, [0x7F]);
    }
}
