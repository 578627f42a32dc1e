use std::time::{Duration, Instant};

/// Wall-clock position of the current item: accumulated time while paused
/// plus the running segment since the last start.
#[derive(Debug, Clone, Default)]
pub struct PlayClock {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl PlayClock {
    /// Jump to `at`; keep running if `running`.
    pub fn reset_to(&mut self, at: Duration, running: bool) {
        self.accumulated = at;
        self.started_at = running.then(Instant::now);
    }

    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
