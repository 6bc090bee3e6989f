use std::time::{Duration, Instant};

use log::debug;

/// Accumulates wall-clock time per stage. `mark` charges the time since the previous mark to
/// the named stage.
#[derive(Debug)]
pub struct Timer {
    last: Instant,
    marks: Vec<(&'static str, Duration)>,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            marks: Vec::new(),
        }
    }

    pub fn mark(&mut self, stage: &'static str) {
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        match self.marks.iter_mut().find(|(name, _)| *name == stage) {
            Some((_, total)) => *total += elapsed,
            None => self.marks.push((stage, elapsed)),
        }
    }

    /// Time charged to `stage` so far.
    pub fn total(&self, stage: &str) -> Duration {
        self.marks
            .iter()
            .find(|(name, _)| *name == stage)
            .map(|(_, d)| *d)
            .unwrap_or_default()
    }

    pub fn report(&self) {
        for (stage, elapsed) in &self.marks {
            debug!("Time to {}: {:.6}s", stage, elapsed.as_secs_f64());
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
