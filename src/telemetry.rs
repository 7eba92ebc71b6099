//! Publish telemetry: operation timing and counters.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Snapshot of a publisher's activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metrics {
    /// Component name
    pub component: String,
    /// Snapshot timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Number of operations performed
    pub operation_count: u64,
    /// Average operation duration in milliseconds
    pub avg_operation_duration_ms: f64,
    /// Error count
    pub error_count: u64,
}

/// Timer for measuring a single operation.
pub struct PerformanceTimer {
    start_time: Instant,
    operation_name: String,
}

impl PerformanceTimer {
    /// Start timing an operation.
    pub fn start(operation_name: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            operation_name: operation_name.into(),
        }
    }

    /// Finish timing and return the duration.
    pub fn finish(self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }
}

/// Collector accumulating operation timings and errors for a component.
pub struct TelemetryCollector {
    component: String,
    operation_times: Vec<Duration>,
    error_count: u64,
}

impl TelemetryCollector {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            operation_times: Vec::new(),
            error_count: 0,
        }
    }

    /// Record a completed operation.
    pub fn record_operation(&mut self, duration: Duration) {
        self.operation_times.push(duration);
    }

    /// Record an error occurrence.
    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    /// Take a timestamped snapshot of the collected metrics.
    pub fn snapshot(&self) -> Metrics {
        let avg = if self.operation_times.is_empty() {
            0.0
        } else {
            let total: Duration = self.operation_times.iter().sum();
            total.as_millis() as f64 / self.operation_times.len() as f64
        };
        Metrics {
            component: self.component.clone(),
            timestamp: chrono::Utc::now(),
            operation_count: self.operation_times.len() as u64,
            avg_operation_duration_ms: avg,
            error_count: self.error_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_averages_operation_durations() {
        let mut collector = TelemetryCollector::new("framewire-pub");
        collector.record_operation(Duration::from_millis(100));
        collector.record_operation(Duration::from_millis(200));
        collector.record_error();

        let metrics = collector.snapshot();
        assert_eq!(metrics.component, "framewire-pub");
        assert_eq!(metrics.operation_count, 2);
        assert_eq!(metrics.avg_operation_duration_ms, 150.0);
        assert_eq!(metrics.error_count, 1);
    }

    #[test]
    fn timer_reports_its_operation_name() {
        let timer = PerformanceTimer::start("publish_frame");
        assert_eq!(timer.operation_name(), "publish_frame");
        let duration = timer.finish();
        assert!(duration.as_secs() < 1);
    }

    #[test]
    fn empty_collector_snapshot_is_zeroed() {
        let metrics = TelemetryCollector::new("idle").snapshot();
        assert_eq!(metrics.operation_count, 0);
        assert_eq!(metrics.avg_operation_duration_ms, 0.0);
        assert_eq!(metrics.error_count, 0);
    }
}
