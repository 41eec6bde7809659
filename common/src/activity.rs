//! Conversion from registered pulses to radiation activity.

use crate::error::Error;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Radiation activity in µR/h.
///
/// `pulse_count` pulses registered over `elapsed_seconds` by a counter with a
/// sensitivity of `sensitivity` pulses per µR.
pub fn activity(pulse_count: u16, sensitivity: u16, elapsed_seconds: f64) -> Result<f64, Error> {
    if sensitivity == 0 {
        return Err(Error::ZeroSensitivity);
    }
    if !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
        return Err(Error::InvalidElapsed(elapsed_seconds));
    }
    Ok(f64::from(pulse_count) * SECONDS_PER_HOUR / (f64::from(sensitivity) * elapsed_seconds))
}
