//! Kafka client connection and topic administration.

use std::sync::Arc;

use rskafka::client::{
    partition::{PartitionClient, UnknownTopicHandling},
    Client, ClientBuilder,
};
use tokio::sync::OnceCell;

use common::{AppError, AppResult, QueueConfig};

/// Lazily connected Kafka client shared by the publisher and the listener.
///
/// The broker is contacted on first use, so the HTTP surface comes up even
/// while Kafka is unreachable.
pub struct KafkaConnector {
    config: QueueConfig,
    client: OnceCell<Arc<Client>>,
}

impl KafkaConnector {
    /// Create a connector for the configured broker.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Queue configuration this connector was built with.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Get the shared client, connecting on first call.
    pub async fn client(&self) -> AppResult<Arc<Client>> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let client = ClientBuilder::new(vec![self.config.address.clone()])
                    .build()
                    .await?;
                tracing::info!(address = %self.config.address, "Connected to Kafka");
                Ok::<_, AppError>(Arc::new(client))
            })
            .await?;

        Ok(Arc::clone(client))
    }

    /// Partition ids of `topic`, creating the topic when it does not exist.
    pub async fn ensure_topic(&self, topic: &str) -> AppResult<Vec<i32>> {
        let client = self.client().await?;

        if let Some(partitions) = topic_partitions(&client, topic).await? {
            return Ok(partitions);
        }

        let timeout_ms = i32::try_from(self.config.write_timeout.as_millis()).unwrap_or(i32::MAX);
        let created = client
            .controller_client()?
            .create_topic(
                topic,
                self.config.topic_partitions,
                self.config.replication_factor,
                timeout_ms,
            )
            .await;

        match created {
            Ok(()) => tracing::info!(
                topic,
                partitions = self.config.topic_partitions,
                "Created topic"
            ),
            Err(e) => {
                // Another producer may have created it in the meantime.
                if topic_partitions(&client, topic).await?.is_none() {
                    return Err(e.into());
                }
                tracing::debug!(topic, "Topic created concurrently");
            }
        }

        Ok(topic_partitions(&client, topic)
            .await?
            .unwrap_or_else(|| (0..self.config.topic_partitions).collect()))
    }

    /// Client bound to a single topic partition.
    pub async fn partition_client(&self, topic: &str, partition: i32) -> AppResult<PartitionClient> {
        let client = self.client().await?;
        let partition_client = client
            .partition_client(topic.to_string(), partition, UnknownTopicHandling::Retry)
            .await?;
        Ok(partition_client)
    }
}

async fn topic_partitions(client: &Client, topic: &str) -> AppResult<Option<Vec<i32>>> {
    let topics = client.list_topics().await?;
    Ok(topics
        .into_iter()
        .find(|t| t.name == topic)
        .map(|t| t.partitions.into_iter().collect()))
}
