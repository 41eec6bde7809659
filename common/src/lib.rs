pub mod activity;
pub mod config;
pub mod error;
pub mod plot;
pub mod radsens;
pub mod sampler;
pub mod sensor;

pub use error::Error;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Bounded history of activity samples shared between the thread sampling the
/// sensor and the one drawing the plot.
///
/// Holds at most `capacity` samples; pushing into a full history drops the
/// oldest one. Cloning gives another handle to the same history.
#[derive(Clone, Debug)]
pub struct ActivityHistory(Arc<Mutex<HistoryInner>>);

#[derive(Debug)]
struct HistoryInner {
    samples: VecDeque<f64>,
    capacity: usize,
    total: u64,
}

/// A copy of the history at one point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistorySnapshot {
    /// Oldest first.
    pub samples: Vec<f64>,
    /// Sequence number of `samples[0]` since the history was created.
    pub first_index: u64,
    /// Number of samples ever pushed.
    pub total: u64,
}

impl ActivityHistory {
    /// Creates an empty history. A `capacity` of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self(Arc::new(Mutex::new(HistoryInner {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        })))
    }

    /// Appends `value`, evicting the oldest sample when full.
    ///
    /// # Panics
    ///
    /// If locking the internally used mutex fails.
    pub fn push(&self, value: f64) {
        let mut inner = self.0.lock().unwrap();
        if inner.samples.len() == inner.capacity {
            inner.samples.pop_front();
        }
        inner.samples.push_back(value);
        inner.total += 1;
    }

    /// Copies the current samples out.
    ///
    /// # Panics
    ///
    /// If locking the mutex fails.
    pub fn snapshot(&self) -> HistorySnapshot {
        let inner = self.0.lock().unwrap();
        let samples: Vec<f64> = inner.samples.iter().copied().collect();
        HistorySnapshot {
            first_index: inner.total - samples.len() as u64,
            total: inner.total,
            samples,
        }
    }

    /// Number of samples ever pushed. Changes whenever the content does.
    pub fn total(&self) -> u64 {
        self.0.lock().unwrap().total
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.0.lock().unwrap().capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_most_recent_samples() {
        let history = ActivityHistory::with_capacity(3);
        for value in 1..=5 {
            history.push(f64::from(value));
        }

        let snapshot = history.snapshot();
        assert_eq!(snapshot.samples, vec![3.0, 4.0, 5.0]);
        assert_eq!(snapshot.first_index, 2);
        assert_eq!(snapshot.total, 5);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn zero_capacity_holds_one_sample() {
        let history = ActivityHistory::with_capacity(0);
        history.push(1.0);
        history.push(2.0);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.snapshot().samples, vec![2.0]);
    }

    #[test]
    fn clones_share_the_samples() {
        let history = ActivityHistory::with_capacity(4);
        assert!(history.is_empty());

        let writer = history.clone();
        std::thread::spawn(move || writer.push(7.5))
            .join()
            .unwrap();

        assert_eq!(history.total(), 1);
        assert_eq!(history.snapshot().samples, vec![7.5]);
    }
}
