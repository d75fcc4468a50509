//! Progress events with ETA estimation

use std::cell::Cell;
use std::time::Instant;

/// Progress tracker for long frame loops, reporting through `tracing`
pub struct ProgressTracker {
    total: u64,
    processed: Cell<u64>,
    start_time: Instant,
    label: String,
}

impl ProgressTracker {
    /// Creates a new progress tracker
    pub fn new(total: u64, label: &str) -> Self {
        Self {
            total,
            processed: Cell::new(0),
            start_time: Instant::now(),
            label: label.to_string(),
        }
    }

    /// Number of items processed so far
    pub fn processed(&self) -> u64 {
        self.processed.get()
    }

    /// Increments the processed count by one and reports every `report_interval` items
    pub fn increment_and_report(&self, report_interval: u64) {
        let current = self.processed.get() + 1;
        self.processed.set(current);
        if current % report_interval.max(1) == 0 || current == self.total {
            self.report(current);
        }
    }

    fn report(&self, current: u64) {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let elapsed = clock(elapsed_secs);

        if current < self.total {
            let rate = current as f64 / elapsed_secs.max(f64::EPSILON);
            tracing::info!(
                stage = %self.label,
                done = current,
                total = self.total,
                percent = format_args!("{:.1}", current as f64 / self.total as f64 * 100.0),
                %elapsed,
                eta = %clock((self.total - current) as f64 / rate),
                "progress"
            );
        } else {
            tracing::info!(stage = %self.label, total = self.total, %elapsed, "completed");
        }
    }
}

/// Renders seconds as `S.Ds` below a minute, `M:SS` or `H:MM:SS` above
fn clock(secs: f64) -> String {
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }
    let total = secs.round() as u64;
    let (hours, mins, secs) = (total / 3600, total / 60 % 60, total % 60);
    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}
