use std::time::{Duration, Instant};

use tracing::info;

const CHECK_EVERY: u64 = 1000;
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Game counter that logs at most once per second. The clock is only read
/// every thousand games.
#[derive(Debug)]
pub struct ProgressMeter {
    label: &'static str,
    started: Instant,
    last_report: Instant,
    count: u64,
}

impl ProgressMeter {
    pub fn new(label: &'static str) -> Self {
        let now = Instant::now();
        Self {
            label,
            started: now,
            last_report: now,
            count: 0,
        }
    }

    pub fn tick(&mut self) {
        self.count += 1;
        if self.count % CHECK_EVERY != 0 {
            return;
        }

        let now = Instant::now();
        if now.duration_since(self.last_report) >= REPORT_INTERVAL {
            self.last_report = now;
            info!(
                games = self.count,
                games_per_sec = self.rate(now),
                "{} in progress",
                self.label
            );
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn rate(&self, now: Instant) -> u64 {
        let secs = now.duration_since(self.started).as_secs_f64();
        if secs > 0.0 {
            (self.count as f64 / secs) as u64
        } else {
            self.count
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_every_game() {
        let mut meter = ProgressMeter::new("reformat");
        for _ in 0..2500 {
            meter.tick();
        }
        assert_eq!(meter.count(), 2500);
    }
}
