//! # Frame Timing Statistics
//!
//! Per-frame timings recorded by the coordinator and aggregated across the
//! run. Aggregation is additive only; the accumulator is cheap enough to
//! stay enabled in production.

use std::time::Duration;

/// Timing breakdown of one completed frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Activity evaluation pass time in microseconds.
    pub evaluate_us: u64,
    /// Task submit + drain time in microseconds.
    pub dispatch_us: u64,
    /// Snapshot publish time in microseconds.
    pub publish_us: u64,
    /// Entities stepped this frame.
    pub active: usize,
    /// Entities served from cached state.
    pub cached: usize,
    /// Tasks that failed this frame.
    pub failures: usize,
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of evaluation pass times.
    pub evaluate_us_sum: u64,
    /// Sum of dispatch times.
    pub dispatch_us_sum: u64,
    /// Sum of publish times.
    pub publish_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded the target frame time.
    pub frames_over_budget: u64,
    /// Total task failures across the run.
    pub failures: u64,
    target_frame_us: u64,
}

impl FrameStatsAccumulator {
    /// Creates an accumulator judging frames against `target_frame_time`.
    #[must_use]
    pub fn new(target_frame_time: Duration) -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            evaluate_us_sum: 0,
            dispatch_us_sum: 0,
            publish_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            failures: 0,
            target_frame_us: target_frame_time.as_micros() as u64,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.evaluate_us_sum += stats.evaluate_us;
        self.dispatch_us_sum += stats.dispatch_us;
        self.publish_us_sum += stats.publish_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.failures += stats.failures as u64;

        if self.target_frame_us > 0 && stats.total_us > self.target_frame_us {
            self.frames_over_budget += 1;
            tracing::warn!(
                frame = stats.frame,
                total_ms = stats.total_us as f64 / 1000.0,
                target_ms = self.target_frame_us as f64 / 1000.0,
                "frame exceeded budget"
            );
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average ticks per second.
    #[must_use]
    pub fn avg_tps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a one-shot summary of the run.
    pub fn log_summary(&self) {
        if self.frames_recorded == 0 {
            tracing::info!("no frames recorded");
            return;
        }
        let frames = self.frames_recorded as f64;
        tracing::info!(
            frames = self.frames_recorded,
            avg_ms = self.avg_frame_ms(),
            avg_tps = self.avg_tps(),
            min_ms = self.min_frame_us as f64 / 1000.0,
            max_ms = self.max_frame_us as f64 / 1000.0,
            avg_evaluate_ms = (self.evaluate_us_sum as f64 / frames) / 1000.0,
            avg_dispatch_ms = (self.dispatch_us_sum as f64 / frames) / 1000.0,
            avg_publish_ms = (self.publish_us_sum as f64 / frames) / 1000.0,
            over_budget_pct = self.over_budget_ratio() * 100.0,
            failures = self.failures,
            "frame statistics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_aggregates() {
        let mut acc = FrameStatsAccumulator::new(Duration::from_micros(16_666));

        for i in 0..100 {
            acc.record(FrameStats {
                frame: i,
                total_us: 10_000 + i * 100,
                evaluate_us: 1000,
                dispatch_us: 8000,
                publish_us: 500,
                active: 50,
                cached: 10,
                failures: 0,
            });
        }

        assert_eq!(acc.frames_recorded, 100);
        assert_eq!(acc.min_frame_us, 10_000);
        assert_eq!(acc.max_frame_us, 19_900);
        assert!(acc.avg_tps() > 50.0);
        assert!(acc.avg_tps() < 100.0);
        // Frames above 16_666us count against the budget.
        assert_eq!(acc.frames_over_budget, 100 - 67);
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = FrameStatsAccumulator::new(Duration::from_micros(16_666));
        assert_eq!(acc.avg_frame_ms(), 0.0);
        assert_eq!(acc.avg_tps(), 0.0);
        assert_eq!(acc.over_budget_ratio(), 0.0);
    }
}
