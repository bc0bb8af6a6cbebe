//! Raw payload publishing to Kafka topics.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rskafka::{
    client::partition::{Compression, PartitionClient},
    record::Record,
};
use tokio::sync::Mutex;

use super::LeastBytes;
use crate::infra::KafkaConnector;
use common::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Publisher trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish `payload` unchanged as a single record on `topic`
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()>;
}

/// Kafka publisher with least-bytes partition selection.
///
/// Topics are created on first use when the broker does not know them yet.
pub struct KafkaPublisher {
    connector: Arc<KafkaConnector>,
    balancer: LeastBytes,
    topics: Mutex<HashMap<String, Vec<i32>>>,
    clients: Mutex<HashMap<(String, i32), Arc<PartitionClient>>>,
}

impl KafkaPublisher {
    pub fn new(connector: Arc<KafkaConnector>) -> Self {
        Self {
            connector,
            balancer: LeastBytes::new(),
            topics: Mutex::new(HashMap::new()),
            clients: Mutex::new(HashMap::new()),
        }
    }

    async fn partitions(&self, topic: &str) -> AppResult<Vec<i32>> {
        let mut topics = self.topics.lock().await;
        if let Some(partitions) = topics.get(topic) {
            return Ok(partitions.clone());
        }

        let partitions = self.connector.ensure_topic(topic).await?;
        topics.insert(topic.to_string(), partitions.clone());
        Ok(partitions)
    }

    async fn partition_client(&self, topic: &str, partition: i32) -> AppResult<Arc<PartitionClient>> {
        let mut clients = self.clients.lock().await;
        let key = (topic.to_string(), partition);
        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(self.connector.partition_client(topic, partition).await?);
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }
}

#[async_trait]
impl MessagePublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()> {
        let partitions = self.partitions(topic).await?;
        let partition = self
            .balancer
            .pick(&partitions)
            .ok_or_else(|| AppError::internal(format!("Topic '{}' has no partitions", topic)))?;
        let client = self.partition_client(topic, partition).await?;

        let size = payload.len();
        let record = Record {
            key: None,
            value: Some(payload),
            headers: BTreeMap::new(),
            timestamp: Utc::now(),
        };

        let write_timeout = self.connector.config().write_timeout;
        let offsets = tokio::time::timeout(
            write_timeout,
            client.produce(vec![record], Compression::NoCompression),
        )
        .await
        .map_err(|_| {
            AppError::timeout(format!(
                "producing to {}/{} took longer than {:?}",
                topic, partition, write_timeout
            ))
        })??;
        self.balancer.record(partition, size);

        tracing::debug!(
            topic,
            partition,
            bytes = size,
            offset = ?offsets.first(),
            "Published message"
        );
        Ok(())
    }
}
