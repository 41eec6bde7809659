use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

use crate::radsens::registers::CHIP_ID;

/// Everything that can go wrong while talking to the sensor or converting its counts.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// The bus transaction failed (no device at the address, NACK, transport error).
    #[error("bus transaction failed: {0}")]
    Bus(ErrorKind),

    /// A device answered, but it is not a RadSens.
    #[error("chip id mismatch: expected 0x{expected:02X}, found 0x{found:02X}")]
    ChipIdMismatch { expected: u8, found: u8 },

    /// The sensor reported a sensitivity of zero pulses per µR.
    #[error("sensitivity is zero, activity is undefined")]
    ZeroSensitivity,

    /// The registration interval must be a positive, finite number of seconds.
    #[error("invalid elapsed time: {0} s")]
    InvalidElapsed(f64),
}

impl Error {
    pub(crate) fn chip_id_mismatch(found: u8) -> Self {
        Self::ChipIdMismatch {
            expected: CHIP_ID,
            found,
        }
    }

    /// Map any bus error into [`Error::Bus`], keeping only its kind.
    pub(crate) fn bus<E: embedded_hal::i2c::Error>(error: E) -> Self {
        log::debug!("i2c error: {:?}", error);
        Self::Bus(error.kind())
    }
}
