//! Scripted walk through the sensor's configuration registers.
//!
//! Every block prints the register state before and after each change.

use std::io::Write;

use radsens_common::sensor::RadiationSensor;

const SEPARATOR: &str = "-------------------------------------";

/// Print the chip id (hex) and firmware version.
pub fn print_identity(sensor: &mut dyn RadiationSensor, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "Chip id: 0x{:X}", sensor.chip_id()?)?;
    writeln!(out, "Firmware version: {}", sensor.firmware_version()?)?;
    Ok(())
}

/// Run the sensitivity, HV generator and LED examples in order.
///
/// Leaves the sensor with sensitivity 105, HV generator on and LED on.
pub fn run(sensor: &mut dyn RadiationSensor, out: &mut impl Write) -> anyhow::Result<()> {
    sensitivity_example(sensor, out)?;
    hv_generator_example(sensor, out)?;
    led_example(sensor, out)?;
    Ok(())
}

fn sensitivity_example(sensor: &mut dyn RadiationSensor, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "{SEPARATOR}")?;
    writeln!(out, "Set Sensitivity example:\n")?;
    writeln!(out, "\t getSensitivity(): {}", sensor.sensitivity()?)?;

    for sensitivity in [55, 105] {
        writeln!(out, "\t setSensitivity({sensitivity})... ")?;
        sensor.set_sensitivity(sensitivity)?;
        writeln!(out, "\t getSensitivity(): {}", sensor.sensitivity()?)?;
    }
    writeln!(out, "{SEPARATOR}")?;
    Ok(())
}

fn hv_generator_example(sensor: &mut dyn RadiationSensor, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "HW generator example:\n")?;
    writeln!(out, "\n\t HV generator state: {}", sensor.hv_generator_enabled()?)?;

    for enabled in [false, true] {
        writeln!(out, "\t setHVGeneratorState({enabled})... ")?;
        sensor.set_hv_generator_enabled(enabled)?;
        writeln!(out, "\t HV generator state: {}", sensor.hv_generator_enabled()?)?;
    }
    writeln!(out, "{SEPARATOR}")?;
    Ok(())
}

fn led_example(sensor: &mut dyn RadiationSensor, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "LED indication control example:\n")?;
    writeln!(out, "\n\t LED indication state: {}", sensor.led_enabled()?)?;

    for (enabled, action) in [(false, "turn off"), (true, "turn on")] {
        writeln!(out, "\t {action} LED indication... ")?;
        sensor.set_led_enabled(enabled)?;
        writeln!(out, "\t LED indication state: {}", sensor.led_enabled()?)?;
    }
    writeln!(out, "\n{SEPARATOR}")?;
    Ok(())
}
