//! Client configuration.

use crate::job::validation::MAX_UPLOAD_BYTES;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the analysis server
    pub base_url: String,
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Largest accepted upload
    pub max_upload_bytes: u64,
    /// Upload timeout; large videos need a generous one
    pub request_timeout: Duration,
    /// Timeout for status, results, health and cleanup requests
    pub status_timeout: Duration,
    /// How long notifications stay on screen
    pub notification_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            poll_interval: Duration::from_millis(2000),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            request_timeout: Duration::from_secs(600),
            status_timeout: Duration::from_secs(10),
            notification_ttl: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            base_url: lookup("ANALYSIS_SERVER_URL").unwrap_or(defaults.base_url),
            poll_interval: number("POLL_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            max_upload_bytes: number("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            request_timeout: number("REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            status_timeout: number("STATUS_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.status_timeout),
            notification_ttl: number("NOTIFICATION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.notification_ttl),
        }
    }
}
