use std::time::Duration;

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use super::registers::*;

/// Power-on sensitivity of the sensor, in pulses per µR.
pub const DEFAULT_SENSITIVITY: u16 = 105;

const DEFAULT_FIRMWARE_VERSION: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedBusError(ErrorKind);

impl i2c::Error for SimulatedBusError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// An in-memory RadSens register file behind an I2C interface.
///
/// Stands in for the real bus in tests and when no sensor is attached. It
/// answers only at its own address, auto-increments the register pointer like
/// the real device and ignores writes to read-only registers.
///
/// With a pulse pattern configured, every read of the pulse counter latches
/// the next pattern entry and refreshes the intensity registers from it.
#[derive(Clone, Debug)]
pub struct SimulatedBus {
    address: u8,
    online: bool,
    registers: [u8; REGISTER_COUNT],
    pointer: u8,
    pulse_pattern: Vec<u16>,
    pulse_reads: u64,
    dynamic_sum: u64,
    transactions_left: Option<u64>,
    transaction_delay: Duration,
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBus {
    /// A sensor in its power-on state at [`DEFAULT_ADDRESS`].
    pub fn new() -> Self {
        Self::with_address(DEFAULT_ADDRESS)
    }

    pub fn with_address(address: u8) -> Self {
        let mut bus = Self {
            address,
            online: true,
            registers: [0; REGISTER_COUNT],
            pointer: 0,
            pulse_pattern: Vec::new(),
            pulse_reads: 0,
            dynamic_sum: 0,
            transactions_left: None,
            transaction_delay: Duration::ZERO,
        };
        bus.set_register(REG_CHIP_ID, CHIP_ID);
        bus.set_register(REG_FIRMWARE_VERSION, DEFAULT_FIRMWARE_VERSION);
        bus.set_register(REG_LED_ENABLE, 1);
        bus.set_register(REG_HV_GENERATOR_ENABLE, 1);
        bus.set_register_u16(REG_SENSITIVITY_H, DEFAULT_SENSITIVITY);
        bus
    }

    /// Cycle the pulse counter through `pattern`, one entry per read.
    pub fn with_pulse_pattern(mut self, pattern: impl IntoIterator<Item = u16>) -> Self {
        self.pulse_pattern = pattern.into_iter().collect();
        self
    }

    /// Answer `transactions` more transactions, then drop off the bus.
    pub fn go_offline_after(mut self, transactions: u64) -> Self {
        self.transactions_left = Some(transactions);
        self
    }

    /// Make every transaction take at least `delay`, like a slow bus.
    pub fn with_transaction_delay(mut self, delay: Duration) -> Self {
        self.transaction_delay = delay;
        self
    }

    /// Take the simulated device off the bus; every transaction then fails.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Read a register directly, bypassing the bus.
    ///
    /// # Panics
    ///
    /// If `register` is outside the register map.
    pub fn register(&self, register: u8) -> u8 {
        self.registers[usize::from(register)]
    }

    /// Write a register directly, including read-only ones.
    ///
    /// # Panics
    ///
    /// If `register` is outside the register map.
    pub fn set_register(&mut self, register: u8, value: u8) {
        self.registers[usize::from(register)] = value;
    }

    pub fn set_register_u16(&mut self, high_register: u8, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.set_register(high_register, high);
        self.set_register(high_register + 1, low);
    }

    fn register_u16(&self, high_register: u8) -> u16 {
        u16::from_be_bytes([self.register(high_register), self.register(high_register + 1)])
    }

    fn is_writable(register: u8) -> bool {
        (REG_LED_ENABLE..=REG_SENSITIVITY_H + 1).contains(&register)
    }

    fn latch_pulses(&mut self) {
        if self.pulse_pattern.is_empty() {
            return;
        }
        let slot = (self.pulse_reads % self.pulse_pattern.len() as u64) as usize;
        let pulses = self.pulse_pattern[slot];
        self.pulse_reads += 1;

        let sensitivity = u64::from(self.register_u16(REG_SENSITIVITY_H));
        let dynamic = (u64::from(pulses) * 3600)
            .checked_div(sensitivity)
            .unwrap_or(0)
            .min(u64::from(u16::MAX));
        self.dynamic_sum += dynamic;
        let average = self.dynamic_sum / self.pulse_reads;

        self.set_register_u16(REG_PULSE_COUNT_H, pulses);
        self.set_register_u16(REG_INTENSITY_DYNAMIC_H, dynamic as u16);
        self.set_register_u16(REG_INTENSITY_STATIC_H, average as u16);
    }

    fn read_next(&mut self) -> u8 {
        if self.pointer == REG_PULSE_COUNT_H {
            self.latch_pulses();
        }
        let value = self
            .registers
            .get(usize::from(self.pointer))
            .copied()
            .unwrap_or(0);
        self.pointer = self.pointer.wrapping_add(1);
        value
    }

    fn write_next(&mut self, value: u8) -> Result<(), SimulatedBusError> {
        if usize::from(self.pointer) >= REGISTER_COUNT {
            return Err(SimulatedBusError(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Data,
            )));
        }
        if Self::is_writable(self.pointer) {
            self.set_register(self.pointer, value);
        }
        self.pointer = self.pointer.wrapping_add(1);
        Ok(())
    }
}

impl ErrorType for SimulatedBus {
    type Error = SimulatedBusError;
}

impl I2c for SimulatedBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if !self.transaction_delay.is_zero() {
            std::thread::sleep(self.transaction_delay);
        }
        match self.transactions_left {
            Some(0) => self.online = false,
            Some(ref mut left) => *left -= 1,
            None => {}
        }
        if !self.online {
            return Err(SimulatedBusError(ErrorKind::Bus));
        }
        if address != self.address {
            return Err(SimulatedBusError(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )));
        }

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((register, data)) = bytes.split_first() {
                        self.pointer = *register;
                        for value in data {
                            self.write_next(*value)?;
                        }
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = self.read_next();
                    }
                }
            }
        }
        Ok(())
    }
}

#[test]
fn read_only_registers_ignore_writes() {
    let mut bus = SimulatedBus::new();
    bus.write(DEFAULT_ADDRESS, &[REG_CHIP_ID, 0x00]).unwrap();
    assert_eq!(bus.register(REG_CHIP_ID), CHIP_ID);
}

#[test]
fn burst_read_auto_increments() {
    let mut bus = SimulatedBus::new();
    let mut buf = [0u8; 2];
    bus.write_read(DEFAULT_ADDRESS, &[REG_SENSITIVITY_H], &mut buf)
        .unwrap();
    assert_eq!(u16::from_be_bytes(buf), DEFAULT_SENSITIVITY);
}

#[test]
fn pulse_pattern_advances_per_read() {
    let mut bus = SimulatedBus::new().with_pulse_pattern([3, 0]);
    let read_pulses = |bus: &mut SimulatedBus| {
        let mut buf = [0u8; 2];
        bus.write_read(DEFAULT_ADDRESS, &[REG_PULSE_COUNT_H], &mut buf)
            .unwrap();
        u16::from_be_bytes(buf)
    };

    assert_eq!(read_pulses(&mut bus), 3);
    assert_eq!(bus.register_u16(REG_INTENSITY_DYNAMIC_H), 3 * 3600 / 105);
    assert_eq!(read_pulses(&mut bus), 0);
    assert_eq!(bus.register_u16(REG_INTENSITY_STATIC_H), 3 * 3600 / 105 / 2);
    assert_eq!(read_pulses(&mut bus), 3);
}

#[test]
fn drops_off_the_bus_after_the_given_transactions() {
    let mut bus = SimulatedBus::new().go_offline_after(2);
    let mut buf = [0u8; 1];
    assert!(bus.write_read(DEFAULT_ADDRESS, &[REG_CHIP_ID], &mut buf).is_ok());
    assert!(bus.write_read(DEFAULT_ADDRESS, &[REG_CHIP_ID], &mut buf).is_ok());
    let error = bus
        .write_read(DEFAULT_ADDRESS, &[REG_CHIP_ID], &mut buf)
        .unwrap_err();
    assert_eq!(i2c::Error::kind(&error), ErrorKind::Bus);
}

#[test]
fn writes_past_the_register_map_are_refused() {
    let mut bus = SimulatedBus::new();
    let result = bus.write(DEFAULT_ADDRESS, &[0x20, 0x01]);
    assert_eq!(
        i2c::Error::kind(&result.unwrap_err()),
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
    );
}
