use std::fmt;

use embedded_hal::i2c::I2c;

use crate::error::Error;
use crate::radsens::RadSens;

pub type SensorPointer = Box<dyn RadiationSensor + Send>;

/// The operations the app needs from a radiation sensor.
///
/// Implemented by [`RadSens`] for any I2C bus, so hardware and simulated
/// sensors can be held behind the same [`SensorPointer`].
pub trait RadiationSensor {
    fn init(&mut self) -> Result<(), Error>;

    fn chip_id(&mut self) -> Result<u8, Error>;
    fn firmware_version(&mut self) -> Result<u8, Error>;

    fn sensitivity(&mut self) -> Result<u16, Error>;
    fn set_sensitivity(&mut self, sensitivity: u16) -> Result<(), Error>;

    fn hv_generator_enabled(&mut self) -> Result<bool, Error>;
    fn set_hv_generator_enabled(&mut self, enabled: bool) -> Result<(), Error>;

    fn led_enabled(&mut self) -> Result<bool, Error>;
    fn set_led_enabled(&mut self, enabled: bool) -> Result<(), Error>;

    fn intensity_dynamic(&mut self) -> Result<u16, Error>;
    fn intensity_static(&mut self) -> Result<u16, Error>;
    fn pulse_count(&mut self) -> Result<u16, Error>;
}

impl<I2C: I2c> RadiationSensor for RadSens<I2C> {
    fn init(&mut self) -> Result<(), Error> {
        RadSens::init(self)
    }

    fn chip_id(&mut self) -> Result<u8, Error> {
        RadSens::chip_id(self)
    }

    fn firmware_version(&mut self) -> Result<u8, Error> {
        RadSens::firmware_version(self)
    }

    fn sensitivity(&mut self) -> Result<u16, Error> {
        RadSens::sensitivity(self)
    }

    fn set_sensitivity(&mut self, sensitivity: u16) -> Result<(), Error> {
        RadSens::set_sensitivity(self, sensitivity)
    }

    fn hv_generator_enabled(&mut self) -> Result<bool, Error> {
        RadSens::hv_generator_enabled(self)
    }

    fn set_hv_generator_enabled(&mut self, enabled: bool) -> Result<(), Error> {
        RadSens::set_hv_generator_enabled(self, enabled)
    }

    fn led_enabled(&mut self) -> Result<bool, Error> {
        RadSens::led_enabled(self)
    }

    fn set_led_enabled(&mut self, enabled: bool) -> Result<(), Error> {
        RadSens::set_led_enabled(self, enabled)
    }

    fn intensity_dynamic(&mut self) -> Result<u16, Error> {
        RadSens::intensity_dynamic(self)
    }

    fn intensity_static(&mut self) -> Result<u16, Error> {
        RadSens::intensity_static(self)
    }

    fn pulse_count(&mut self) -> Result<u16, Error> {
        RadSens::pulse_count(self)
    }
}

/// The values gathered in one sampling tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    pub pulse_count: u16,
    pub sensitivity: u16,
    pub intensity_dynamic: u16,
    pub intensity_static: u16,
    /// µR/h
    pub activity: f64,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rad intensity dynamic: {} μR/h", self.intensity_dynamic)?;
        writeln!(f, "Rad intensity static: {} μR/h", self.intensity_static)?;
        writeln!(f, "Number of pulses: {}", self.pulse_count)?;
        write!(f, "Radiation activity: {} μR/h", self.activity)
    }
}

#[test]
fn reading_prints_four_diagnostic_lines() {
    let reading = Reading {
        pulse_count: 100,
        sensitivity: 55,
        intensity_dynamic: 12,
        intensity_static: 9,
        activity: 6545.5,
    };
    assert_eq!(
        reading.to_string(),
        "Rad intensity dynamic: 12 μR/h\n\
         Rad intensity static: 9 μR/h\n\
         Number of pulses: 100\n\
         Radiation activity: 6545.5 μR/h"
    );
}
