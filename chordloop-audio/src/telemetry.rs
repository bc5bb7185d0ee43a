//! Audio thread loop telemetry: how long each wake-up took and how late the
//! events it fired were.
//!
//! Fixed-size ring buffer, no allocation per sample.

use std::time::Duration;

/// Ring buffer size for busy-time samples.
const SAMPLE_BUFFER_SIZE: usize = 256;

/// Summary of one reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySummary {
    pub samples: usize,
    pub avg_busy_us: u32,
    pub max_busy_us: u32,
    pub p95_busy_us: u32,
    /// Worst gap between an event's deadline and the moment it fired.
    pub max_late_us: u32,
    /// Wake-ups whose busy time exceeded the budget. Cumulative.
    pub overruns: u64,
}

pub struct LoopTelemetry {
    busy_us: [u32; SAMPLE_BUFFER_SIZE],
    idx: usize,
    sample_count: usize,
    max_busy_us: u32,
    max_late_us: u32,
    overrun_count: u64,
}

impl Default for LoopTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

fn micros(d: Duration) -> u32 {
    d.as_micros().min(u32::MAX as u128) as u32
}

impl LoopTelemetry {
    pub fn new() -> Self {
        Self {
            busy_us: [0; SAMPLE_BUFFER_SIZE],
            idx: 0,
            sample_count: 0,
            max_busy_us: 0,
            max_late_us: 0,
            overrun_count: 0,
        }
    }

    /// Record one loop iteration that did work.
    #[inline]
    pub fn record(&mut self, busy: Duration, budget: Duration) {
        let us = micros(busy);
        self.busy_us[self.idx] = us;
        self.idx = (self.idx + 1) % SAMPLE_BUFFER_SIZE;
        if self.sample_count < SAMPLE_BUFFER_SIZE {
            self.sample_count += 1;
        }
        self.max_busy_us = self.max_busy_us.max(us);
        if busy > budget {
            self.overrun_count += 1;
        }
    }

    /// Record how far past its deadline an event fired.
    #[inline]
    pub fn record_lateness(&mut self, late: Duration) {
        self.max_late_us = self.max_late_us.max(micros(late));
    }

    /// Summarize the window and reset the maxima. Overruns stay cumulative.
    pub fn take_summary(&mut self) -> TelemetrySummary {
        if self.sample_count == 0 {
            let late = std::mem::take(&mut self.max_late_us);
            return TelemetrySummary { max_late_us: late, overruns: self.overrun_count, ..Default::default() };
        }

        let samples = &self.busy_us[..self.sample_count];
        let sum: u64 = samples.iter().map(|&x| x as u64).sum();
        let avg = (sum / self.sample_count as u64) as u32;

        let mut sorted = self.busy_us;
        sorted[..self.sample_count].sort_unstable();
        let p95_idx = (self.sample_count * 95 / 100).max(1) - 1;
        let p95 = sorted[p95_idx.min(self.sample_count - 1)];

        let summary = TelemetrySummary {
            samples: self.sample_count,
            avg_busy_us: avg,
            max_busy_us: self.max_busy_us,
            p95_busy_us: p95,
            max_late_us: self.max_late_us,
            overruns: self.overrun_count,
        };
        self.max_busy_us = 0;
        self.max_late_us = 0;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET: Duration = Duration::from_micros(500);

    #[test]
    fn test_telemetry_basic() {
        let mut t = LoopTelemetry::new();
        t.record(Duration::from_micros(100), BUDGET);
        t.record(Duration::from_micros(200), BUDGET);
        t.record(Duration::from_micros(300), BUDGET);
        t.record_lateness(Duration::from_micros(40));

        let s = t.take_summary();
        assert_eq!(s.samples, 3);
        assert_eq!(s.avg_busy_us, 200);
        assert_eq!(s.max_busy_us, 300);
        assert_eq!(s.max_late_us, 40);
        assert_eq!(s.overruns, 0);

        let s = t.take_summary();
        assert_eq!(s.max_busy_us, 0);
        assert_eq!(s.max_late_us, 0);
    }

    #[test]
    fn test_telemetry_overruns_accumulate() {
        let mut t = LoopTelemetry::new();
        t.record(Duration::from_micros(400), BUDGET);
        t.record(Duration::from_micros(600), BUDGET);
        t.record(Duration::from_micros(800), BUDGET);
        assert_eq!(t.take_summary().overruns, 2);
        t.record(Duration::from_micros(900), BUDGET);
        assert_eq!(t.take_summary().overruns, 3);
    }

    #[test]
    fn test_empty_window() {
        let mut t = LoopTelemetry::new();
        assert_eq!(t.take_summary(), TelemetrySummary::default());
    }
}
