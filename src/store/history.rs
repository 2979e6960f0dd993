//! Bounded diagnostics history for charting.

use std::collections::VecDeque;

use fleetwatch_types::DiagnosticsSample;

/// Maximum number of samples kept per device.
pub const MAX_HISTORY_SIZE: usize = 50;

/// FIFO ring buffer of diagnostics samples for one device.
///
/// Samples stay in insertion (chronological) order. Once the buffer holds
/// [`MAX_HISTORY_SIZE`] samples, each push evicts the oldest one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleHistory {
    samples: VecDeque<DiagnosticsSample>,
}

impl SampleHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Append a sample, evicting from the front past the capacity.
    pub fn push(&mut self, sample: DiagnosticsSample) {
        self.samples.push_back(sample);
        while self.samples.len() > MAX_HISTORY_SIZE {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticsSample> {
        self.samples.iter()
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&DiagnosticsSample> {
        self.samples.back()
    }

    /// The oldest retained sample.
    pub fn oldest(&self) -> Option<&DiagnosticsSample> {
        self.samples.front()
    }

    /// Copy the samples out, oldest first.
    pub fn to_vec(&self) -> Vec<DiagnosticsSample> {
        self.samples.iter().copied().collect()
    }

    /// Mean CPU usage over the retained samples.
    pub fn average_cpu(&self) -> Option<f64> {
        self.average(|s| s.cpu)
    }

    /// Mean memory usage over the retained samples.
    pub fn average_memory(&self) -> Option<f64> {
        self.average(|s| s.memory)
    }

    /// Get sparkline data for CPU usage (0-7 for 8 bar levels).
    pub fn cpu_sparkline(&self) -> Vec<u8> {
        normalize_sparkline(self.samples.iter().map(|s| s.cpu))
    }

    /// Get sparkline data for memory usage (0-7 for 8 bar levels).
    pub fn memory_sparkline(&self) -> Vec<u8> {
        normalize_sparkline(self.samples.iter().map(|s| s.memory))
    }

    fn average(&self, value: impl Fn(&DiagnosticsSample) -> f64) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(value).sum();
        Some(sum / self.samples.len() as f64)
    }
}

/// Map percentages onto 0-7. Out-of-range and NaN values are clamped.
fn normalize_sparkline(values: impl Iterator<Item = f64>) -> Vec<u8> {
    values
        .map(|v| {
            let clamped = if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) };
            (clamped / 100.0 * 7.0).round() as u8
        })
        .collect()
}
