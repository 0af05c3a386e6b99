use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://candidates.democracyclub.org.uk/api/next";
pub const DEFAULT_ELECTION: &str = "parl.2019-12-12";
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONSTITUENCY_FILE: &str = "data/constituencies.json";

/// Settings for talking to the candidates API.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub election: String,
    /// Maximum ballot requests in flight at once.
    pub concurrency: usize,
    /// Retries after the first failed attempt of a single request.
    pub max_retries: u32,
    /// Delay before the first retry; grows linearly with each attempt.
    pub retry_backoff: Duration,
    pub timeout: Duration,
    /// Results buffered between the fetch task and the aggregator.
    pub channel_capacity: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            election: DEFAULT_ELECTION.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            channel_capacity: 64,
        }
    }
}
