//! Thread-safe metrics collection system
//!
//! Atomic counters for the orchestrator's submission/dispatch/result flow and
//! for agent-side evaluation, plus a mutex-protected window of evaluation
//! times for percentile reporting.

use crate::error::current_timestamp;
use crate::orchestrator::ResultOutcome;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const MAX_TIMING_SAMPLES: usize = 1000;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics and a mutex
pub struct MetricsCollector {
    // Orchestrator side
    expressions_submitted: AtomicU64,
    expressions_rejected: AtomicU64,
    queue_saturations: AtomicU64,
    tasks_dispatched: AtomicU64,
    results_completed: AtomicU64,
    results_failed: AtomicU64,
    results_ignored: AtomicU64,

    // Agent side
    tasks_evaluated: AtomicU64,
    evaluation_errors: AtomicU64,
    idle_polls: AtomicU64,
    fetch_failures: AtomicU64,
    report_failures: AtomicU64,
    evaluation_times: Mutex<Vec<u64>>, // in milliseconds

    uptime_start: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            expressions_submitted: AtomicU64::new(0),
            expressions_rejected: AtomicU64::new(0),
            queue_saturations: AtomicU64::new(0),
            tasks_dispatched: AtomicU64::new(0),
            results_completed: AtomicU64::new(0),
            results_failed: AtomicU64::new(0),
            results_ignored: AtomicU64::new(0),
            tasks_evaluated: AtomicU64::new(0),
            evaluation_errors: AtomicU64::new(0),
            idle_polls: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            report_failures: AtomicU64::new(0),
            evaluation_times: Mutex::new(Vec::new()),
            uptime_start: AtomicU64::new(current_timestamp()),
        }
    }

    // Orchestrator metrics
    pub fn expression_submitted(&self) {
        self.expressions_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn expression_rejected(&self) {
        self.expressions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn queue_saturated(&self) {
        self.queue_saturations.fetch_add(1, Ordering::Relaxed);
        self.expressions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_dispatched(&self) {
        self.tasks_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn result_received(&self, outcome: ResultOutcome) {
        let counter = match outcome {
            ResultOutcome::Completed => &self.results_completed,
            ResultOutcome::Failed => &self.results_failed,
            ResultOutcome::Ignored => &self.results_ignored,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    // Agent metrics
    pub fn task_evaluated(&self, duration: Duration, success: bool) {
        self.tasks_evaluated.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.evaluation_errors.fetch_add(1, Ordering::Relaxed);
        }
        self.record_evaluation_time(duration);
    }

    pub fn idle_poll(&self) {
        self.idle_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report_failed(&self) {
        self.report_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_evaluation_time(&self, duration: Duration) {
        if let Ok(mut times) = self.evaluation_times.lock() {
            times.push(duration.as_millis() as u64);

            if times.len() > MAX_TIMING_SAMPLES {
                times.remove(0);
            }
        }
    }

    // Reset all metrics (useful for testing)
    pub fn reset(&self) {
        for counter in [
            &self.expressions_submitted,
            &self.expressions_rejected,
            &self.queue_saturations,
            &self.tasks_dispatched,
            &self.results_completed,
            &self.results_failed,
            &self.results_ignored,
            &self.tasks_evaluated,
            &self.evaluation_errors,
            &self.idle_polls,
            &self.fetch_failures,
            &self.report_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        if let Ok(mut times) = self.evaluation_times.lock() {
            times.clear();
        }
        self.uptime_start
            .store(current_timestamp(), Ordering::Relaxed);
    }

    /// Average and percentiles of recorded evaluation times
    fn evaluation_time_statistics(&self) -> (f64, f64, f64, f64) {
        let Ok(times) = self.evaluation_times.lock() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        let mut sorted_times = times.clone();
        sorted_times.sort_unstable();

        let avg = sorted_times.iter().sum::<u64>() as f64 / sorted_times.len() as f64;
        (
            avg,
            percentile(&sorted_times, 50.0),
            percentile(&sorted_times, 95.0),
            percentile(&sorted_times, 99.0),
        )
    }

    /// Get complete metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg, p50, p95, p99) = self.evaluation_time_statistics();

        MetricsSnapshot {
            orchestrator: OrchestratorMetrics {
                expressions_submitted: self.expressions_submitted.load(Ordering::Relaxed),
                expressions_rejected: self.expressions_rejected.load(Ordering::Relaxed),
                queue_saturations: self.queue_saturations.load(Ordering::Relaxed),
                tasks_dispatched: self.tasks_dispatched.load(Ordering::Relaxed),
                results_completed: self.results_completed.load(Ordering::Relaxed),
                results_failed: self.results_failed.load(Ordering::Relaxed),
                results_ignored: self.results_ignored.load(Ordering::Relaxed),
            },
            agent: AgentMetrics {
                tasks_evaluated: self.tasks_evaluated.load(Ordering::Relaxed),
                evaluation_errors: self.evaluation_errors.load(Ordering::Relaxed),
                idle_polls: self.idle_polls.load(Ordering::Relaxed),
                fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
                report_failures: self.report_failures.load(Ordering::Relaxed),
                avg_evaluation_time_ms: avg,
                evaluation_time_p50_ms: p50,
                evaluation_time_p95_ms: p95,
                evaluation_time_p99_ms: p99,
            },
            uptime_seconds: now.saturating_sub(self.uptime_start.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub orchestrator: OrchestratorMetrics,
    pub agent: AgentMetrics,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct OrchestratorMetrics {
    pub expressions_submitted: u64,
    pub expressions_rejected: u64,
    pub queue_saturations: u64,
    pub tasks_dispatched: u64,
    pub results_completed: u64,
    pub results_failed: u64,
    pub results_ignored: u64,
}

#[derive(Debug, Serialize)]
pub struct AgentMetrics {
    pub tasks_evaluated: u64,
    pub evaluation_errors: u64,
    pub idle_polls: u64,
    pub fetch_failures: u64,
    pub report_failures: u64,
    pub avg_evaluation_time_ms: f64,
    pub evaluation_time_p50_ms: f64,
    pub evaluation_time_p95_ms: f64,
    pub evaluation_time_p99_ms: f64,
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower_index = index.floor() as usize;
        let upper_index = index.ceil() as usize;
        let lower_value = sorted_data[lower_index] as f64;
        let upper_value = sorted_data[upper_index] as f64;

        lower_value + (upper_value - lower_value) * index.fract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_orchestrator_metrics() {
        let collector = MetricsCollector::new();

        collector.expression_submitted();
        collector.expression_rejected();
        collector.queue_saturated();
        collector.task_dispatched();
        collector.result_received(ResultOutcome::Completed);
        collector.result_received(ResultOutcome::Ignored);
        collector.result_received(ResultOutcome::Failed);

        let metrics = collector.get_metrics();
        assert_eq!(metrics.orchestrator.expressions_submitted, 1);
        assert_eq!(metrics.orchestrator.expressions_rejected, 2);
        assert_eq!(metrics.orchestrator.queue_saturations, 1);
        assert_eq!(metrics.orchestrator.tasks_dispatched, 1);
        assert_eq!(metrics.orchestrator.results_completed, 1);
        assert_eq!(metrics.orchestrator.results_failed, 1);
        assert_eq!(metrics.orchestrator.results_ignored, 1);
    }

    #[test]
    fn test_agent_metrics() {
        let collector = MetricsCollector::new();

        collector.task_evaluated(Duration::from_millis(1500), true);
        collector.task_evaluated(Duration::from_millis(500), false);
        collector.idle_poll();
        collector.fetch_failed();
        collector.report_failed();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.agent.tasks_evaluated, 2);
        assert_eq!(metrics.agent.evaluation_errors, 1);
        assert_eq!(metrics.agent.idle_polls, 1);
        assert_eq!(metrics.agent.fetch_failures, 1);
        assert_eq!(metrics.agent.report_failures, 1);
        assert!((metrics.agent.avg_evaluation_time_ms - 1000.0).abs() < 0.1);
    }

    #[test]
    fn test_thread_safety() {
        let collector = Arc::new(MetricsCollector::new());

        let mut handles = vec![];

        for _ in 0..10 {
            let collector_clone = Arc::clone(&collector);
            let handle = thread::spawn(move || {
                for _ in 0..100 {
                    collector_clone.task_dispatched();
                    collector_clone.idle_poll();
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = collector.get_metrics();
        assert_eq!(metrics.orchestrator.tasks_dispatched, 1000);
        assert_eq!(metrics.agent.idle_polls, 1000);
    }

    #[test]
    fn test_percentile_calculation() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

        let p50 = percentile(&data, 50.0);
        let p95 = percentile(&data, 95.0);
        let p0 = percentile(&data, 0.0);
        let p100 = percentile(&data, 100.0);

        assert!((p50 - 5.5).abs() < 0.1, "P50: expected ~5.5, got {p50}");
        assert!((p95 - 9.55).abs() < 0.1, "P95: expected ~9.55, got {p95}");
        assert!((p0 - 1.0).abs() < 0.1, "P0: expected ~1.0, got {p0}");
        assert!(
            (p100 - 10.0).abs() < 0.1,
            "P100: expected ~10.0, got {p100}"
        );

        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_evaluation_time_window_is_bounded() {
        let collector = MetricsCollector::new();

        for i in 0..1500 {
            collector.task_evaluated(Duration::from_millis(i), true);
        }

        assert_eq!(
            collector.evaluation_times.lock().unwrap().len(),
            MAX_TIMING_SAMPLES
        );
        assert_eq!(collector.get_metrics().agent.tasks_evaluated, 1500);
    }

    #[test]
    fn test_reset_functionality() {
        let collector = MetricsCollector::new();

        collector.expression_submitted();
        collector.task_evaluated(Duration::from_millis(100), true);

        collector.reset();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.orchestrator.expressions_submitted, 0);
        assert_eq!(metrics.agent.tasks_evaluated, 0);
        assert_eq!(metrics.agent.avg_evaluation_time_ms, 0.0);
    }
}
