//! User service configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use common::{DatabaseConfig, QueueConfig, RetryConfig, ServiceConfig, StartOffset};
use domain::{USER_TOPIC, USER_TOPIC_PARTITION};

/// User service configuration, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct UserServiceConfig {
    /// HTTP bind address
    pub server: ServiceConfig,
    /// Relational store
    pub database: DatabaseConfig,
    /// Kafka broker and user topic
    pub queue: QueueConfig,
}

impl UserServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Missing keys fall back to defaults. Values that fail to parse are
    /// reported and replaced by the default as well.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_defaults = ServiceConfig::default();
        let db_defaults = DatabaseConfig::default();
        let queue_defaults = QueueConfig::default();
        let retry_defaults = RetryConfig::default();

        let server = ServiceConfig {
            host: lookup("SERVICE_HOST").unwrap_or(server_defaults.host),
            port: parsed(&lookup, "SERVICE_PORT", server_defaults.port),
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL"),
            host: lookup("DB_HOST").unwrap_or(db_defaults.host),
            port: parsed(&lookup, "DB_PORT", db_defaults.port),
            user: lookup("DB_USER").unwrap_or(db_defaults.user),
            password: lookup("DB_PASSWORD").unwrap_or(db_defaults.password),
            name: lookup("DB_NAME").unwrap_or(db_defaults.name),
            max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", db_defaults.max_connections),
            min_connections: parsed(&lookup, "DB_MIN_CONNECTIONS", db_defaults.min_connections),
        };

        let retry = RetryConfig {
            max_retries: parsed(&lookup, "KAFKA_LISTENER_MAX_RETRIES", retry_defaults.max_retries),
            initial_backoff: millis(&lookup, "KAFKA_LISTENER_BACKOFF_MS", retry_defaults.initial_backoff),
            max_backoff: millis(&lookup, "KAFKA_LISTENER_MAX_BACKOFF_MS", retry_defaults.max_backoff),
        };

        let queue = QueueConfig {
            address: lookup("KAFKA_ADDRESS").unwrap_or(queue_defaults.address),
            topic: lookup("KAFKA_USER_TOPIC").unwrap_or_else(|| USER_TOPIC.to_string()),
            partition: parsed(&lookup, "KAFKA_PARTITION", USER_TOPIC_PARTITION),
            topic_partitions: parsed(&lookup, "KAFKA_TOPIC_PARTITIONS", queue_defaults.topic_partitions),
            replication_factor: parsed(
                &lookup,
                "KAFKA_REPLICATION_FACTOR",
                queue_defaults.replication_factor,
            ),
            write_timeout: seconds(&lookup, "KAFKA_WRITE_DEADLINE", queue_defaults.write_timeout),
            read_timeout: seconds(&lookup, "KAFKA_READ_DEADLINE", queue_defaults.read_timeout),
            reader_min_bytes: parsed(&lookup, "KAFKA_READER_MIN", queue_defaults.reader_min_bytes),
            reader_max_bytes: parsed(&lookup, "KAFKA_READER_MAX", queue_defaults.reader_max_bytes),
            start_offset: parsed::<StartOffset, _>(
                &lookup,
                "KAFKA_START_OFFSET",
                queue_defaults.start_offset,
            ),
            retry,
        };

        Self {
            server,
            database,
            queue,
        }
    }
}

/// Parse `key` or fall back to `default`, warning on malformed values.
fn parsed<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Malformed configuration value, using default {:?}", default);
            default
        }),
        None => default,
    }
}

fn seconds<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    Duration::from_secs(parsed(lookup, key, default.as_secs()))
}

fn millis<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    Duration::from_millis(parsed(lookup, key, default.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> UserServiceConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        UserServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);

        assert_eq!(config.server.addr(), "0.0.0.0:8080");
        assert_eq!(config.database.url(), "postgres://postgres@localhost:5432/test_db");
        assert_eq!(config.queue.address, "localhost:9092");
        assert_eq!(config.queue.topic, "user-topic");
        assert_eq!(config.queue.partition, 0);
        assert_eq!(config.queue.reader_min_bytes, 1_000);
        assert_eq!(config.queue.reader_max_bytes, 1_000_000);
        assert_eq!(config.queue.write_timeout, Duration::from_secs(10));
        assert_eq!(config.queue.start_offset, StartOffset::Earliest);
    }

    #[test]
    fn test_values_from_lookup() {
        let config = config_from(&[
            ("SERVICE_PORT", "9000"),
            ("DB_HOST", "db"),
            ("DB_NAME", "users"),
            ("KAFKA_ADDRESS", "kafka:29092"),
            ("KAFKA_PARTITION", "2"),
            ("KAFKA_READ_DEADLINE", "3"),
            ("KAFKA_READER_MAX", "2048"),
            ("KAFKA_START_OFFSET", "latest"),
            ("KAFKA_LISTENER_BACKOFF_MS", "25"),
        ]);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.url(), "postgres://postgres@db:5432/users");
        assert_eq!(config.queue.address, "kafka:29092");
        assert_eq!(config.queue.partition, 2);
        assert_eq!(config.queue.read_timeout, Duration::from_secs(3));
        assert_eq!(config.queue.reader_max_bytes, 2048);
        assert_eq!(config.queue.start_offset, StartOffset::Latest);
        assert_eq!(config.queue.retry.initial_backoff, Duration::from_millis(25));
    }

    #[test]
    fn test_malformed_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("SERVICE_PORT", "eighty"),
            ("KAFKA_PARTITION", "first"),
            ("KAFKA_READER_MIN", "-x"),
            ("KAFKA_START_OFFSET", "middle"),
        ]);

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.queue.partition, 0);
        assert_eq!(config.queue.reader_min_bytes, 1_000);
        assert_eq!(config.queue.start_offset, StartOffset::Earliest);
    }
}
