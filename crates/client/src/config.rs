use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5001";
pub const DEFAULT_POLL_MS: u64 = 2000;
pub const DEFAULT_SESSION: &str = "default";
const MIN_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: Url,
    pub poll_interval: Duration,
    pub session: String,
    pub session_db: PathBuf,
    pub output: OutputFormat,
}

impl ClientConfig {
    pub fn new(server: Url) -> Self {
        Self {
            server,
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            session: DEFAULT_SESSION.to_string(),
            session_db: default_session_db(),
            output: OutputFormat::Text,
        }
    }

    /// Poll cadence, floored so a typo cannot hammer the server.
    pub fn with_poll_interval(mut self, every: Duration) -> Self {
        self.poll_interval = every.max(MIN_POLL);
        self
    }
}

pub fn default_session_db() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hexline")
        .join("session.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_is_floored() {
        let cfg = ClientConfig::new(Url::parse(DEFAULT_SERVER).unwrap())
            .with_poll_interval(Duration::ZERO);
        assert_eq!(cfg.poll_interval, MIN_POLL);
        assert!(cfg.session_db.ends_with(".hexline/session.db"));
    }
}
