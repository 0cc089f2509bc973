use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use orchestrator::AttemptOutcome;

pub struct Metrics {
    // Counters
    analysis_attempts: AtomicUsize,
    primary_failures: AtomicUsize,
    superseded_attempts: AtomicUsize,
    enrichment_failures: AtomicUsize,
    memos_generated: AtomicUsize,
    memo_failures: AtomicUsize,
    chat_turns: AtomicUsize,
    failed_chat_turns: AtomicUsize,

    // Timing (in microseconds)
    total_analysis_time_us: AtomicU64,
    completed_analyses: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            analysis_attempts: AtomicUsize::new(0),
            primary_failures: AtomicUsize::new(0),
            superseded_attempts: AtomicUsize::new(0),
            enrichment_failures: AtomicUsize::new(0),
            memos_generated: AtomicUsize::new(0),
            memo_failures: AtomicUsize::new(0),
            chat_turns: AtomicUsize::new(0),
            failed_chat_turns: AtomicUsize::new(0),
            total_analysis_time_us: AtomicU64::new(0),
            completed_analyses: AtomicUsize::new(0),
        })
    }

    pub fn record_attempt(&self) {
        self.analysis_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how an attempt ended and how many enrichment calls failed.
    pub fn record_outcome(
        &self,
        outcome: &AttemptOutcome,
        duration: Duration,
        enrichment_failures: usize,
    ) {
        match outcome {
            AttemptOutcome::Ready => {
                self.total_analysis_time_us
                    .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
                self.completed_analyses.fetch_add(1, Ordering::Relaxed);
                self.enrichment_failures
                    .fetch_add(enrichment_failures, Ordering::Relaxed);
            }
            AttemptOutcome::Failed(_) => {
                self.primary_failures.fetch_add(1, Ordering::Relaxed);
            }
            AttemptOutcome::Superseded => {
                self.superseded_attempts.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_memo(&self, success: bool) {
        if success {
            self.memos_generated.fetch_add(1, Ordering::Relaxed);
        } else {
            self.memo_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_chat_turn(&self, failed: bool) {
        self.chat_turns.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_chat_turns.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            analysis_attempts: self.analysis_attempts.load(Ordering::Relaxed),
            primary_failures: self.primary_failures.load(Ordering::Relaxed),
            superseded_attempts: self.superseded_attempts.load(Ordering::Relaxed),
            enrichment_failures: self.enrichment_failures.load(Ordering::Relaxed),
            memos_generated: self.memos_generated.load(Ordering::Relaxed),
            memo_failures: self.memo_failures.load(Ordering::Relaxed),
            chat_turns: self.chat_turns.load(Ordering::Relaxed),
            failed_chat_turns: self.failed_chat_turns.load(Ordering::Relaxed),
            avg_analysis_time_ms: self
                .avg_time_ms(&self.total_analysis_time_us, &self.completed_analyses),
        }
    }

    fn avg_time_ms(&self, total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
        let total = total_us.load(Ordering::Relaxed) as f64;
        let cnt = count.load(Ordering::Relaxed) as f64;
        if cnt > 0.0 {
            total / cnt / 1000.0 // Convert to ms
        } else {
            0.0
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub analysis_attempts: usize,
    pub primary_failures: usize,
    pub superseded_attempts: usize,
    pub enrichment_failures: usize,
    pub memos_generated: usize,
    pub memo_failures: usize,
    pub chat_turns: usize,
    pub failed_chat_turns: usize,
    pub avg_analysis_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_counted() {
        let metrics = Metrics::new();
        metrics.record_attempt();
        metrics.record_attempt();
        metrics.record_outcome(&AttemptOutcome::Ready, Duration::from_millis(40), 2);
        metrics.record_outcome(&AttemptOutcome::Superseded, Duration::from_millis(5), 0);
        metrics.record_chat_turn(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.analysis_attempts, 2);
        assert_eq!(snapshot.enrichment_failures, 2);
        assert_eq!(snapshot.superseded_attempts, 1);
        assert_eq!(snapshot.failed_chat_turns, 1);
        assert!((snapshot.avg_analysis_time_ms - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_average_without_samples() {
        assert_eq!(Metrics::new().snapshot().avg_analysis_time_ms, 0.0);
    }
}
