//! Periodic sensor polling.

use std::time::{Duration, Instant};

use crate::activity::activity;
use crate::error::Error;
use crate::sensor::{Reading, SensorPointer};
use crate::ActivityHistory;

/// Reads the sensor at a fixed interval and feeds the [`ActivityHistory`].
pub struct Sampler {
    sensor: SensorPointer,
    history: ActivityHistory,
    interval: Duration,
    elapsed_seconds: f64,
}

impl Sampler {
    /// `elapsed_seconds` is the registration interval used in the activity
    /// formula. It is independent of the polling `interval`.
    pub fn new(
        sensor: SensorPointer,
        history: ActivityHistory,
        interval: Duration,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            sensor,
            history,
            interval,
            elapsed_seconds,
        }
    }

    /// Take one reading, print its diagnostic lines to stdout, append its
    /// activity to the history and return it.
    pub fn tick(&mut self) -> Result<Reading, Error> {
        let pulse_count = self.sensor.pulse_count()?;
        let sensitivity = self.sensor.sensitivity()?;
        let activity = activity(pulse_count, sensitivity, self.elapsed_seconds)?;

        let reading = Reading {
            pulse_count,
            sensitivity,
            intensity_dynamic: self.sensor.intensity_dynamic()?,
            intensity_static: self.sensor.intensity_static()?,
            activity,
        };

        println!("{reading}");
        self.history.push(activity);
        Ok(reading)
    }

    /// Sample forever on a [`Schedule`]. Returns on the first error.
    pub fn run(mut self) -> Result<(), Error> {
        log::info!(
            "Sampling every {:?} (registration interval {} s)",
            self.interval,
            self.elapsed_seconds
        );

        let mut schedule = Schedule::new(self.interval, Instant::now());
        loop {
            self.tick().inspect_err(|e| {
                log::error!("Sampling stopped: {}", e);
            })?;

            match schedule.advance(Instant::now()) {
                Ok(wait) => std::thread::sleep(wait),
                Err(behind) => log::warn!("Sampling overran its interval by {:?}", behind),
            }
        }
    }
}

/// Fixed-rate deadlines on a monotonic clock.
///
/// Each deadline is the previous one plus the interval, so time spent on the
/// bus does not accumulate as drift. After an overrun the schedule restarts
/// from the current instant instead of firing a burst of late ticks.
#[derive(Clone, Copy, Debug)]
pub struct Schedule {
    interval: Duration,
    deadline: Instant,
}

impl Schedule {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            deadline: start,
        }
    }

    /// Move to the next deadline.
    ///
    /// Returns how long to wait from `now`, or `Err` with how far behind the
    /// schedule was when the deadline had already passed.
    pub fn advance(&mut self, now: Instant) -> Result<Duration, Duration> {
        self.deadline += self.interval;
        match self.deadline.checked_duration_since(now) {
            Some(wait) => Ok(wait),
            None => {
                let behind = now - self.deadline;
                self.deadline = now;
                Err(behind)
            }
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radsens::registers::{REG_PULSE_COUNT_H, REG_SENSITIVITY_H};
    use crate::radsens::{RadSens, SimulatedBus};

    fn sampler(bus: SimulatedBus, history: &ActivityHistory, elapsed: f64) -> Sampler {
        Sampler::new(
            Box::new(RadSens::new(bus)),
            history.clone(),
            Duration::from_millis(1),
            elapsed,
        )
    }

    #[test]
    fn tick_appends_activity() {
        let mut bus = SimulatedBus::new();
        bus.set_register_u16(REG_SENSITIVITY_H, 100);
        bus.set_register_u16(REG_PULSE_COUNT_H, 5);
        let history = ActivityHistory::with_capacity(8);
        let mut sampler = sampler(bus, &history, 2.0);

        let reading = sampler.tick().unwrap();
        sampler.tick().unwrap();

        assert_eq!(reading.activity, 5.0 * 3600.0 / (100.0 * 2.0));
        assert_eq!(history.snapshot().samples, vec![90.0, 90.0]);
    }

    #[test]
    fn zero_sensitivity_stops_the_tick() {
        let mut bus = SimulatedBus::new();
        bus.set_register_u16(REG_SENSITIVITY_H, 0);
        let history = ActivityHistory::with_capacity(8);

        let result = sampler(bus, &history, 1.0).tick();

        assert_eq!(result, Err(Error::ZeroSensitivity));
        assert!(history.is_empty());
    }

    /// Transactions per tick: four 16 bit values, one per register byte.
    const TRANSACTIONS_PER_TICK: u64 = 8;

    #[test]
    fn schedule_keeps_a_fixed_rate() {
        let start = Instant::now();
        let ms = Duration::from_millis;
        let mut schedule = Schedule::new(ms(100), start);

        assert_eq!(schedule.advance(start + ms(30)), Ok(ms(70)));
        assert_eq!(schedule.advance(start + ms(150)), Ok(ms(50)));
        assert_eq!(schedule.deadline(), start + ms(200));
    }

    #[test]
    fn schedule_restarts_after_an_overrun() {
        let start = Instant::now();
        let ms = Duration::from_millis;
        let mut schedule = Schedule::new(ms(100), start);

        assert_eq!(schedule.advance(start + ms(160)), Err(ms(60)));
        assert_eq!(schedule.deadline(), start + ms(160));
        assert_eq!(schedule.advance(start + ms(170)), Ok(ms(90)));
    }

    #[test]
    fn run_samples_at_the_interval_until_the_bus_fails() {
        let ticks = 3;
        let interval = Duration::from_millis(20);
        let bus = SimulatedBus::new().go_offline_after(ticks * TRANSACTIONS_PER_TICK);
        let history = ActivityHistory::with_capacity(8);
        let sampler = Sampler::new(Box::new(RadSens::new(bus)), history.clone(), interval, 1.0);

        let started = Instant::now();
        let result = sampler.run();

        assert!(matches!(result, Err(Error::Bus(_))));
        assert_eq!(history.total(), ticks);
        assert!(started.elapsed() >= interval * (ticks as u32 - 1));
    }

    #[test]
    fn run_keeps_sampling_when_ticks_overrun() {
        let ticks = 4;
        let bus = SimulatedBus::new()
            .with_transaction_delay(Duration::from_millis(1))
            .go_offline_after(ticks * TRANSACTIONS_PER_TICK);
        let history = ActivityHistory::with_capacity(8);
        let sampler = Sampler::new(
            Box::new(RadSens::new(bus)),
            history.clone(),
            Duration::from_millis(1),
            1.0,
        );

        assert!(matches!(sampler.run(), Err(Error::Bus(_))));
        assert_eq!(history.total(), ticks);
    }

    #[test]
    fn run_returns_the_first_bus_error() {
        let mut bus = SimulatedBus::new();
        bus.set_online(false);
        let history = ActivityHistory::with_capacity(8);

        let result = sampler(bus, &history, 1.0).run();

        assert!(matches!(result, Err(Error::Bus(_))));
    }
}
