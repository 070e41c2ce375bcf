use std::time::{Duration, Instant};

/// Elapsed time of the local participant's current turn.
///
/// Purely observational. Starting always resets to zero, so re-entering a
/// turn never resumes an older count.
#[derive(Debug, Default)]
pub struct TurnClock {
    started_at: Option<Instant>,
}

impl TurnClock {
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
    }

    /// `MM:SS`, or `None` while stopped.
    pub fn display(&self, now: Instant) -> Option<String> {
        self.elapsed(now).map(format_elapsed)
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
