//! Shared configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP bind configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl ServiceConfig {
    /// Get the full bind address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Database configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Connection URL for the configured database.
    pub fn url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        if self.password.is_empty() {
            format!(
                "postgres://{}@{}:{}/{}",
                self.user, self.host, self.port, self.name
            )
        } else {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            )
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "test_db".to_string(),
            max_connections: 10,
            min_connections: 1,
        }
    }
}

/// Where a consumer starts reading when it first attaches to a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StartOffset {
    Earliest,
    Latest,
}

impl std::str::FromStr for StartOffset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "earliest" => Ok(StartOffset::Earliest),
            "latest" => Ok(StartOffset::Latest),
            other => Err(format!("unknown start offset '{}'", other)),
        }
    }
}

/// Bounded retry policy for long-running background tasks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Consecutive failures tolerated before giving up
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for the delay between retries
    pub max_backoff: Duration,
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based), doubling from the
    /// initial backoff and capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Kafka connection and topic configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Broker address (host:port)
    pub address: String,
    /// Topic carrying user-creation events
    pub topic: String,
    /// Partition the listener reads
    pub partition: i32,
    /// Partition count used when the topic has to be created
    pub topic_partitions: i32,
    /// Replication factor used when the topic has to be created
    pub replication_factor: i16,
    /// Upper bound for a single produce call
    pub write_timeout: Duration,
    /// Maximum time a fetch waits for data
    pub read_timeout: Duration,
    /// Minimum bytes a fetch waits for
    pub reader_min_bytes: i32,
    /// Maximum bytes a fetch returns
    pub reader_max_bytes: i32,
    /// Offset the listener starts from
    pub start_offset: StartOffset,
    /// Listener retry policy
    pub retry: RetryConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            address: "localhost:9092".to_string(),
            topic: "user-topic".to_string(),
            partition: 0,
            topic_partitions: 1,
            replication_factor: 1,
            write_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            reader_min_bytes: 1_000,
            reader_max_bytes: 1_000_000,
            start_offset: StartOffset::Earliest,
            retry: RetryConfig::default(),
        }
    }
}
