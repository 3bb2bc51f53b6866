use std::path::PathBuf;
use std::time::Duration;

/// Connection and timing settings for one client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: String,
    /// Local copy of the map, shown until the first snapshot arrives.
    pub map_path: PathBuf,
    pub poll_interval: Duration,
    /// Limit on one request/response exchange, connect included.
    pub call_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: shared::DEFAULT_SERVER_ADDR.to_string(),
            map_path: PathBuf::from(shared::DEFAULT_MAP_PATH),
            poll_interval: Duration::from_millis(200),
            call_timeout: Duration::from_secs(1),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(100),
        }
    }
}
