//! Blocking RadSens driver.
//!
//! Each accessor maps to one SMBus "byte data" transaction per register:
//! a read writes the register offset and reads back one byte with a repeated
//! start, a write sends the offset followed by the value. 16 bit values take
//! two transactions, high byte first.

use embedded_hal::i2c::I2c;

use super::registers::*;
use crate::error::Error;

/// A RadSens sensor on an I2C bus.
///
/// The driver owns the bus. Use [`RadSens::release`] to get it back.
pub struct RadSens<I2C> {
    address: u8,
    bus: I2C,
}

impl<I2C: I2c> RadSens<I2C> {
    /// Create a driver for the sensor at [`DEFAULT_ADDRESS`].
    pub fn new(bus: I2C) -> Self {
        Self::with_address(bus, DEFAULT_ADDRESS)
    }

    pub fn with_address(bus: I2C, address: u8) -> Self {
        Self { address, bus }
    }

    /// Check that a RadSens answers at the configured address.
    ///
    /// Distinguishes a bus that does not respond ([`Error::Bus`]) from a device
    /// that is not a RadSens ([`Error::ChipIdMismatch`]).
    pub fn init(&mut self) -> Result<(), Error> {
        let found = self.chip_id()?;
        if found != CHIP_ID {
            return Err(Error::chip_id_mismatch(found));
        }
        log::info!(
            "RadSens found at 0x{:02X} (chip id 0x{:02X})",
            self.address,
            found
        );
        Ok(())
    }

    /// Boolean form of [`RadSens::init`].
    pub fn initialize(&mut self) -> bool {
        self.init().is_ok()
    }

    pub fn chip_id(&mut self) -> Result<u8, Error> {
        self.read_u8(REG_CHIP_ID)
    }

    pub fn firmware_version(&mut self) -> Result<u8, Error> {
        self.read_u8(REG_FIRMWARE_VERSION)
    }

    /// Counter sensitivity in pulses per µR.
    pub fn sensitivity(&mut self) -> Result<u16, Error> {
        self.read_u16(REG_SENSITIVITY_H)
    }

    pub fn set_sensitivity(&mut self, sensitivity: u16) -> Result<(), Error> {
        self.write_u16(REG_SENSITIVITY_H, sensitivity)
    }

    pub fn hv_generator_enabled(&mut self) -> Result<bool, Error> {
        self.read_flag(REG_HV_GENERATOR_ENABLE)
    }

    pub fn set_hv_generator_enabled(&mut self, enabled: bool) -> Result<(), Error> {
        self.write_u8(REG_HV_GENERATOR_ENABLE, u8::from(enabled))
    }

    pub fn led_enabled(&mut self) -> Result<bool, Error> {
        self.read_flag(REG_LED_ENABLE)
    }

    pub fn set_led_enabled(&mut self, enabled: bool) -> Result<(), Error> {
        self.write_u8(REG_LED_ENABLE, u8::from(enabled))
    }

    /// Intensity over the sensor's short sliding window, in µR/h.
    pub fn intensity_dynamic(&mut self) -> Result<u16, Error> {
        self.read_u16(REG_INTENSITY_DYNAMIC_H)
    }

    /// Intensity averaged since power-up, in µR/h.
    pub fn intensity_static(&mut self) -> Result<u16, Error> {
        self.read_u16(REG_INTENSITY_STATIC_H)
    }

    /// Pulses registered since the previous read of this register.
    pub fn pulse_count(&mut self) -> Result<u16, Error> {
        self.read_u16(REG_PULSE_COUNT_H)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn bus(&self) -> &I2C {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut I2C {
        &mut self.bus
    }

    /// Destroy the driver and hand back the bus.
    pub fn release(self) -> I2C {
        self.bus
    }

    fn read_u8(&mut self, register: u8) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.bus
            .write_read(self.address, &[register], &mut buf)
            .map_err(Error::bus)?;
        Ok(buf[0])
    }

    fn write_u8(&mut self, register: u8, value: u8) -> Result<(), Error> {
        self.bus
            .write(self.address, &[register, value])
            .map_err(Error::bus)
    }

    fn read_u16(&mut self, high_register: u8) -> Result<u16, Error> {
        let high = self.read_u8(high_register)?;
        let low = self.read_u8(high_register + 1)?;
        Ok(u16::from_be_bytes([high, low]))
    }

    fn write_u16(&mut self, high_register: u8, value: u16) -> Result<(), Error> {
        let [high, low] = value.to_be_bytes();
        self.write_u8(high_register, high)?;
        self.write_u8(high_register + 1, low)
    }

    fn read_flag(&mut self, register: u8) -> Result<bool, Error> {
        Ok(self.read_u8(register)? == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radsens::SimulatedBus;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

    fn sensor() -> RadSens<SimulatedBus> {
        RadSens::new(SimulatedBus::new())
    }

    #[test]
    fn sensitivity_round_trips_over_full_range() {
        let mut sensor = sensor();
        for value in 0..=u16::MAX {
            sensor.set_sensitivity(value).unwrap();
            assert_eq!(sensor.sensitivity().unwrap(), value);
        }
    }

    #[test]
    fn sensitivity_is_stored_high_byte_first() {
        let mut sensor = sensor();
        sensor.set_sensitivity(0x1234).unwrap();
        assert_eq!(sensor.bus().register(REG_SENSITIVITY_H), 0x12);
        assert_eq!(sensor.bus().register(REG_SENSITIVITY_H + 1), 0x34);
    }

    #[test]
    fn hv_generator_toggles() {
        let mut sensor = sensor();
        for state in [false, true, true, false] {
            sensor.set_hv_generator_enabled(state).unwrap();
            assert_eq!(sensor.hv_generator_enabled().unwrap(), state);
        }
        assert_eq!(sensor.bus().register(REG_HV_GENERATOR_ENABLE), 0);
    }

    #[test]
    fn led_toggles() {
        let mut sensor = sensor();
        for state in [false, true, false, true] {
            sensor.set_led_enabled(state).unwrap();
            assert_eq!(sensor.led_enabled().unwrap(), state);
        }
        assert_eq!(sensor.bus().register(REG_LED_ENABLE), 1);
    }

    #[test]
    fn flag_other_than_one_reads_as_disabled() {
        let mut sensor = sensor();
        sensor.bus_mut().set_register(REG_LED_ENABLE, 2);
        assert!(!sensor.led_enabled().unwrap());
    }

    #[test]
    fn sixteen_bit_readings_combine_register_pairs() {
        let mut bus = SimulatedBus::new();
        bus.set_register_u16(REG_INTENSITY_DYNAMIC_H, 0x0102);
        bus.set_register_u16(REG_INTENSITY_STATIC_H, 0x00FF);
        bus.set_register_u16(REG_PULSE_COUNT_H, 0xABCD);
        let mut sensor = RadSens::new(bus);

        assert_eq!(sensor.intensity_dynamic().unwrap(), 0x0102);
        assert_eq!(sensor.intensity_static().unwrap(), 0x00FF);
        assert_eq!(sensor.pulse_count().unwrap(), 0xABCD);
    }

    #[test]
    fn initialize_accepts_only_the_radsens_chip_id() {
        for id in 0..=u8::MAX {
            let mut bus = SimulatedBus::new();
            bus.set_register(REG_CHIP_ID, id);
            let mut sensor = RadSens::new(bus);
            assert_eq!(sensor.initialize(), id == CHIP_ID, "chip id 0x{id:02X}");
        }
    }

    #[test]
    fn init_reports_chip_id_mismatch() {
        let mut bus = SimulatedBus::new();
        bus.set_register(REG_CHIP_ID, 0x42);
        let mut sensor = RadSens::new(bus);
        assert_eq!(
            sensor.init(),
            Err(Error::ChipIdMismatch {
                expected: CHIP_ID,
                found: 0x42
            })
        );
    }

    #[test]
    fn init_reports_unreachable_bus() {
        let mut sensor = RadSens::with_address(SimulatedBus::new(), 0x67);
        assert_eq!(
            sensor.init(),
            Err(Error::Bus(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address
            )))
        );
        assert!(!sensor.initialize());
    }

    #[test]
    fn release_hands_back_the_bus_with_its_state() {
        let mut sensor = RadSens::with_address(SimulatedBus::new(), DEFAULT_ADDRESS);
        sensor.set_led_enabled(false).unwrap();
        sensor.set_sensitivity(300).unwrap();
        assert_eq!(sensor.address(), DEFAULT_ADDRESS);

        let bus = sensor.release();
        assert_eq!(bus.register(REG_LED_ENABLE), 0);
        assert_eq!(bus.register(REG_SENSITIVITY_H), 0x01);
        assert_eq!(bus.register(REG_SENSITIVITY_H + 1), 0x2C);

        let mut sensor = RadSens::new(bus);
        assert_eq!(sensor.sensitivity().unwrap(), 300);
    }

    #[test]
    fn bus_errors_propagate_from_accessors() {
        let mut sensor = sensor();
        sensor.bus_mut().set_online(false);
        assert!(matches!(sensor.pulse_count(), Err(Error::Bus(_))));
        assert!(matches!(sensor.set_led_enabled(true), Err(Error::Bus(_))));
    }
}
