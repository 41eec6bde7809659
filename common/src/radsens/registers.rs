//! RadSens register map.
//!
//! Every register is one byte wide. 16 bit values are split across two
//! consecutive registers, high byte first.

/// Default 7-bit I2C address.
pub const DEFAULT_ADDRESS: u8 = 0x66;

/// Value of [`REG_CHIP_ID`] on a genuine sensor.
pub const CHIP_ID: u8 = 0x7D;

pub const REG_CHIP_ID: u8 = 0x00;
pub const REG_FIRMWARE_VERSION: u8 = 0x01;
pub const REG_INTENSITY_DYNAMIC_H: u8 = 0x03; // µR/h, low byte at 0x04
pub const REG_INTENSITY_STATIC_H: u8 = 0x06; // µR/h, low byte at 0x07
pub const REG_PULSE_COUNT_H: u8 = 0x09; // low byte at 0x0A
pub const REG_LED_ENABLE: u8 = 0x10;
pub const REG_HV_GENERATOR_ENABLE: u8 = 0x11;
pub const REG_SENSITIVITY_H: u8 = 0x12; // pulses per µR, low byte at 0x13

/// Number of addressable registers.
pub const REGISTER_COUNT: usize = 0x14;
