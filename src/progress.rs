use std::time::{Duration, Instant};

/// Throttled progress lines for long runs.
///
/// A line is logged when the completed percentage advanced by at least
/// `step_percent` since the last line, or when `heartbeat` elapsed.
#[derive(Debug)]
pub struct ProgressReporter {
    total: usize,
    done: usize,
    step_percent: u32,
    heartbeat: Duration,
    last_percent: u32,
    last_emit: Instant,
    started: Instant,
    emitted: usize,
}

impl ProgressReporter {
    pub fn new(total: usize, step_percent: u32, heartbeat: Duration) -> Self {
        let now = Instant::now();
        Self {
            total,
            done: 0,
            step_percent: step_percent.max(1),
            heartbeat,
            last_percent: 0,
            last_emit: now,
            started: now,
            emitted: 0,
        }
    }

    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        ((self.done.min(self.total) * 100) / self.total) as u32
    }

    /// Records one processed unit. Returns true when a line was logged.
    pub fn bump(&mut self, kind: &str, detail: &str) -> bool {
        self.done += 1;
        let percent = self.percent();
        let stepped = percent >= self.last_percent + self.step_percent;
        let beat = !self.heartbeat.is_zero() && self.last_emit.elapsed() >= self.heartbeat;
        if !stepped && !beat {
            return false;
        }
        log::info!(
            "Progress {}% ({}/{}) after {} {}",
            percent,
            self.done,
            self.total,
            kind,
            detail
        );
        self.last_percent = percent;
        self.last_emit = Instant::now();
        self.emitted += 1;
        true
    }

    /// Logs the completion line.
    pub fn finalize(&mut self, detail: &str) {
        log::info!(
            "Finished {} units in {:.2?}: {}",
            self.done,
            self.started.elapsed(),
            detail
        );
        self.emitted += 1;
    }

    /// Number of lines logged so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}
