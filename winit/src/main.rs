// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod demo;

slint::include_modules!();

use std::time::Duration;

use radsens_common::config::Config;
use radsens_common::plot::{PlotFrame, Plotter};
use radsens_common::radsens::{RadSens, SimulatedBus};
use radsens_common::sampler::Sampler;
use radsens_common::sensor::{RadiationSensor, SensorPointer};
use radsens_common::ActivityHistory;

/// Pulses per sampling tick fed to the simulated sensor: a quiet background
/// with the occasional burst.
const SIMULATED_PULSES: [u16; 16] = [0, 1, 0, 0, 1, 0, 2, 0, 1, 0, 0, 0, 1, 3, 1, 0];

/// Our App struct that holds the UI and the plot timer.
///
/// The timer polls the shared activity history and pushes a new plot into the
/// view model whenever the sampler has added samples.
struct App {
    ui: AppWindow,
    history: ActivityHistory,
    timer: slint::Timer,
    redraw_interval: Duration,
    sample_interval: Duration,
}

impl App {
    /// Create a new App struct around a history that is filled elsewhere.
    fn new(config: &Config, history: ActivityHistory) -> anyhow::Result<Self> {
        // Make a new AppWindow
        let ui = AppWindow::new()?;

        Ok(Self {
            ui,
            history,
            timer: slint::Timer::default(),
            redraw_interval: config.redraw_interval(),
            sample_interval: config.sample_interval(),
        })
    }

    /// Start the plot timer and run the UI until the window is closed.
    fn run(&mut self) -> anyhow::Result<()> {
        // Get the handle to the UI as a weak reference.
        let ui_handle = self.ui.as_weak();

        // The timer closure gets its own handle to the history and owns the plotter.
        let history = self.history.clone();
        let mut plotter = Plotter::new(history.capacity(), self.sample_interval);

        self.timer.start(
            slint::TimerMode::Repeated,
            self.redraw_interval,
            move || {
                // Nothing new was sampled since the last frame.
                let Some(frame) = plotter.refresh(&history) else {
                    return;
                };
                let Some(ui) = ui_handle.upgrade() else {
                    return;
                };

                let model = ViewModel::get(&ui);
                model.set_have_data(frame.sample_count > 0);
                model.set_plot(frame.into());
            },
        );

        // Run the UI (and map an error to an anyhow::Error).
        self.ui.run().map_err(|e| e.into())
    }
}

/// Convert a plot frame into the labels and path the window shows.
impl From<PlotFrame> for PlotData {
    fn from(frame: PlotFrame) -> Self {
        Self {
            commands: frame.commands.into(),
            y_max_label: slint::format!("{:.0}", frame.y_max),
            x_start_label: slint::format!("{:.2}", frame.x_start_seconds),
            x_end_label: slint::format!("{:.2}", frame.x_end_seconds),
            latest_label: match frame.latest {
                Some(activity) => slint::format!("{:.2} µR/h", activity),
                None => "-".into(),
            },
            sample_count: frame.sample_count.try_into().unwrap_or(i32::MAX),
            // Set current system time as the timestamp
            timestamp: slint::SharedString::from(
                chrono::Local::now().format("%H:%M:%S").to_string(),
            ),
        }
    }
}

/// Whether this platform can reach a real I2C bus.
const HAS_I2C_BUS: bool = cfg!(target_os = "linux");

/// The simulator is used when asked for, or when there is no bus to talk to.
fn uses_simulator(config: &Config, has_i2c_bus: bool) -> bool {
    config.simulate || !has_i2c_bus
}

/// Open the sensor the configuration asks for.
fn open_sensor(config: &Config) -> anyhow::Result<SensorPointer> {
    if uses_simulator(config, HAS_I2C_BUS) {
        if !config.simulate {
            log::warn!("No I2C support on this platform, falling back to a simulated RadSens");
        }
        return Ok(open_simulated(config));
    }
    open_hardware(config)
}

fn open_simulated(config: &Config) -> SensorPointer {
    log::info!("Using a simulated RadSens at 0x{:02X}", config.address);
    let bus = SimulatedBus::with_address(config.address).with_pulse_pattern(SIMULATED_PULSES);
    Box::new(RadSens::with_address(bus, config.address))
}

#[cfg(target_os = "linux")]
fn open_hardware(config: &Config) -> anyhow::Result<SensorPointer> {
    use anyhow::Context;

    let bus = linux_embedded_hal::I2cdev::new(&config.bus_path)
        .with_context(|| format!("cannot open I2C bus {}", config.bus_path.display()))?;
    log::info!(
        "Using RadSens at 0x{:02X} on {}",
        config.address,
        config.bus_path.display()
    );
    Ok(Box::new(RadSens::with_address(bus, config.address)))
}

// Not reached: `uses_simulator` sends every configuration to the simulator here.
#[cfg(not(target_os = "linux"))]
fn open_hardware(config: &Config) -> anyhow::Result<SensorPointer> {
    Ok(open_simulated(config))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config, source) = Config::load()?;
    match source {
        Some(path) => log::info!("Configuration loaded from {}", path.display()),
        None => log::info!("No configuration file found, using defaults"),
    }

    let mut sensor = open_sensor(&config)?;

    if let Err(e) = sensor.init() {
        log::error!("RadSens initialisation failed: {}", e);
        println!("Sensor wiring error!");
        return Ok(());
    }

    // Show what we are talking to and exercise the configuration registers.
    {
        let mut out = std::io::stdout().lock();
        demo::print_identity(sensor.as_mut(), &mut out)?;
        demo::run(sensor.as_mut(), &mut out)?;
    }

    let history = ActivityHistory::with_capacity(config.history_capacity);

    // The window (and with it the event loop backend) must exist before the
    // sampler can ask it to close.
    let mut app = App::new(&config, history.clone())?;

    let sampler = Sampler::new(
        sensor,
        history.clone(),
        config.sample_interval(),
        config.elapsed_seconds,
    );

    let sampling = std::thread::Builder::new()
        .name("sampler".into())
        .spawn(move || {
            let result = sampler.run();
            // Close the window so the failure surfaces instead of a frozen plot.
            if result.is_err() {
                if let Err(e) = slint::invoke_from_event_loop(|| {
                    let _ = slint::quit_event_loop();
                }) {
                    log::error!("Cannot close the plot window: {}", e);
                }
            }
            result
        })?;

    app.run()?;

    // Closing the window does not stop sampling.
    if !sampling.is_finished() {
        log::info!("Plot window closed, sampling continues");
    }
    match sampling.join() {
        Ok(result) => Ok(result?),
        Err(_) => anyhow::bail!("sampler thread panicked"),
    }
}

#[test]
fn plot_frame_labels() {
    let data: PlotData = PlotFrame {
        commands: "M 0.0 0.0".into(),
        y_max: 10000.0,
        x_start_seconds: 1.5,
        x_end_seconds: 3.25,
        latest: Some(6545.4545),
        sample_count: 8,
    }
    .into();

    assert_eq!(data.commands, "M 0.0 0.0");
    assert_eq!(data.y_max_label, "10000");
    assert_eq!(data.x_start_label, "1.50");
    assert_eq!(data.x_end_label, "3.25");
    assert_eq!(data.latest_label, "6545.45 µR/h");
    assert_eq!(data.sample_count, 8);
}

#[test]
fn simulator_is_used_when_asked_or_without_a_bus() {
    let hardware = Config::default();
    let simulated = Config {
        simulate: true,
        ..Config::default()
    };

    assert!(!uses_simulator(&hardware, true));
    assert!(uses_simulator(&hardware, false));
    assert!(uses_simulator(&simulated, true));
    assert!(uses_simulator(&simulated, false));
}

#[test]
fn simulated_sensor_answers_at_the_configured_address() {
    let config = Config {
        simulate: true,
        address: 0x42,
        ..Config::default()
    };
    let mut sensor = open_sensor(&config).unwrap();

    sensor.init().unwrap();
    assert_eq!(sensor.pulse_count().unwrap(), SIMULATED_PULSES[0]);
    assert_eq!(sensor.pulse_count().unwrap(), SIMULATED_PULSES[1]);
}

#[cfg(not(target_os = "linux"))]
#[test]
fn hardware_mode_falls_back_to_the_simulator() {
    let mut sensor = open_sensor(&Config::default()).unwrap();
    assert!(sensor.init().is_ok());
}
