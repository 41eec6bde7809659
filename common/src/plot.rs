//! Turns the activity history into something the chart can draw.
//!
//! The line is emitted as SVG-style path commands in a fixed
//! [`VIEWBOX_WIDTH`] x [`VIEWBOX_HEIGHT`] coordinate space with the origin at
//! the top left. Each history slot gets a fixed x position, so a full history
//! spans the whole width and a filling one grows from the left.

use std::fmt::Write;
use std::time::Duration;

use crate::{ActivityHistory, HistorySnapshot};

pub const VIEWBOX_WIDTH: f64 = 1000.0;
pub const VIEWBOX_HEIGHT: f64 = 1000.0;

/// Smallest y-axis ceiling, so a quiet background does not fill the chart.
const MIN_Y_MAX: f64 = 10.0;

/// Everything the chart needs for one redraw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlotFrame {
    pub commands: String,
    /// Activity at the top edge of the chart, µR/h.
    pub y_max: f64,
    pub x_start_seconds: f64,
    pub x_end_seconds: f64,
    pub latest: Option<f64>,
    pub sample_count: usize,
}

/// Builds [`PlotFrame`]s, skipping the work when nothing new was sampled.
pub struct Plotter {
    capacity: usize,
    sample_interval: Duration,
    last_total: Option<u64>,
}

impl Plotter {
    pub fn new(capacity: usize, sample_interval: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            sample_interval,
            last_total: None,
        }
    }

    /// A new frame if samples were added since the previous call.
    pub fn refresh(&mut self, history: &ActivityHistory) -> Option<PlotFrame> {
        let total = history.total();
        if self.last_total == Some(total) {
            return None;
        }
        let snapshot = history.snapshot();
        self.last_total = Some(snapshot.total);
        Some(render(&snapshot, self.capacity, self.sample_interval))
    }
}

/// Lay out `snapshot` in a chart with room for `capacity` samples.
pub fn render(snapshot: &HistorySnapshot, capacity: usize, sample_interval: Duration) -> PlotFrame {
    let samples = &snapshot.samples;
    let peak = samples.iter().copied().fold(0.0_f64, f64::max);
    let y_max = nice_ceiling(peak.max(MIN_Y_MAX));

    let step = if capacity > 1 {
        VIEWBOX_WIDTH / (capacity - 1) as f64
    } else {
        0.0
    };

    let mut commands = String::new();
    for (slot, value) in samples.iter().enumerate() {
        let x = slot as f64 * step;
        let y = VIEWBOX_HEIGHT - value.clamp(0.0, y_max) / y_max * VIEWBOX_HEIGHT;
        let verb = if slot == 0 { 'M' } else { 'L' };
        let _ = write!(commands, "{verb} {x:.1} {y:.1} ");
    }
    // A lone sample still needs a segment to be visible.
    if samples.len() == 1 {
        let y = VIEWBOX_HEIGHT - samples[0].clamp(0.0, y_max) / y_max * VIEWBOX_HEIGHT;
        let _ = write!(commands, "L {:.1} {y:.1}", step.max(1.0));
    }

    let seconds = sample_interval.as_secs_f64();
    let last_index = (snapshot.first_index + samples.len() as u64).saturating_sub(1);
    PlotFrame {
        commands: commands.trim_end().to_string(),
        y_max,
        x_start_seconds: snapshot.first_index as f64 * seconds,
        x_end_seconds: last_index as f64 * seconds,
        latest: samples.last().copied(),
        sample_count: samples.len(),
    }
}

/// The smallest value of the form 1, 2 or 5 times a power of ten that is at
/// least `value`.
pub fn nice_ceiling(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powi(value.log10().floor() as i32);
    for factor in [1.0, 2.0, 5.0, 10.0] {
        let candidate = factor * magnitude;
        if candidate >= value * (1.0 - 1e-12) {
            return candidate;
        }
    }
    10.0 * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nice_ceiling_steps() {
        assert_eq!(nice_ceiling(1.0), 1.0);
        assert_eq!(nice_ceiling(1.5), 2.0);
        assert_eq!(nice_ceiling(3.0), 5.0);
        assert_eq!(nice_ceiling(7.0), 10.0);
        assert_eq!(nice_ceiling(20.0), 20.0);
        assert_eq!(nice_ceiling(6545.45), 10000.0);
        assert_eq!(nice_ceiling(0.0), 1.0);
    }

    #[test]
    fn empty_history_draws_nothing() {
        let frame = render(&HistorySnapshot::default(), 10, Duration::from_millis(250));
        assert!(frame.commands.is_empty());
        assert_eq!(frame.latest, None);
        assert_eq!(frame.y_max, MIN_Y_MAX);
    }

    #[test]
    fn points_are_scaled_into_the_viewbox() {
        let snapshot = HistorySnapshot {
            samples: vec![0.0, 10.0, 5.0],
            first_index: 0,
            total: 3,
        };
        let frame = render(&snapshot, 5, Duration::from_millis(250));
        assert_eq!(
            frame.commands,
            "M 0.0 1000.0 L 250.0 0.0 L 500.0 500.0"
        );
        assert_eq!(frame.y_max, 10.0);
        assert_eq!(frame.latest, Some(5.0));
        assert_eq!(frame.x_end_seconds, 0.5);
    }

    #[test]
    fn single_sample_is_drawn_as_a_segment() {
        let snapshot = HistorySnapshot {
            samples: vec![10.0],
            first_index: 0,
            total: 1,
        };
        let frame = render(&snapshot, 3, Duration::from_secs(1));
        assert_eq!(frame.commands, "M 0.0 0.0 L 500.0 0.0");
    }

    #[test]
    fn x_axis_follows_evicted_samples() {
        let history = ActivityHistory::with_capacity(4);
        for _ in 0..10 {
            history.push(1.0);
        }
        let frame = render(&history.snapshot(), 4, Duration::from_millis(500));
        assert_eq!(frame.x_start_seconds, 3.0);
        assert_eq!(frame.x_end_seconds, 4.5);
        assert_eq!(frame.sample_count, 4);
    }

    #[test]
    fn refresh_skips_unchanged_history() {
        let history = ActivityHistory::with_capacity(4);
        let mut plotter = Plotter::new(4, Duration::from_millis(250));

        assert!(plotter.refresh(&history).is_some());
        assert!(plotter.refresh(&history).is_none());

        history.push(42.0);
        let frame = plotter.refresh(&history).unwrap();
        assert_eq!(frame.latest, Some(42.0));
        assert!(plotter.refresh(&history).is_none());
    }
}
