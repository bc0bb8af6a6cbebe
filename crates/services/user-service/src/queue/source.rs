//! Message sources polled by the ingestion listener.

use std::sync::Arc;

use async_trait::async_trait;
use rskafka::client::{
    error::{Error as KafkaError, ProtocolError},
    partition::{OffsetAt, PartitionClient},
};
use rskafka::record::RecordAndOffset;

use crate::infra::KafkaConnector;
use common::{AppResult, StartOffset};

/// A consumed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub offset: i64,
    pub payload: Vec<u8>,
}

/// Ordered stream of messages from one topic partition.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch the next batch; an empty batch means nothing arrived in time.
    ///
    /// Messages are returned once: the source advances past every message it
    /// hands out.
    async fn poll(&mut self) -> AppResult<Vec<Message>>;
}

/// Reads a single partition of a Kafka topic.
///
/// Connects lazily and drops the partition client after a failed fetch, so
/// the next poll reconnects.
pub struct KafkaSource {
    connector: Arc<KafkaConnector>,
    topic: String,
    partition: i32,
    client: Option<PartitionClient>,
    cursor: Cursor,
}

impl KafkaSource {
    /// Source for the configured user topic partition.
    pub fn new(connector: Arc<KafkaConnector>) -> Self {
        let topic = connector.config().topic.clone();
        let partition = connector.config().partition;
        Self {
            connector,
            topic,
            partition,
            client: None,
            cursor: Cursor::default(),
        }
    }

    async fn connect(&self) -> AppResult<PartitionClient> {
        self.connector.ensure_topic(&self.topic).await?;
        let client = self
            .connector
            .partition_client(&self.topic, self.partition)
            .await?;
        tracing::info!(topic = %self.topic, partition = self.partition, "Listening for user messages");
        Ok(client)
    }

    async fn fetch(&mut self, client: &PartitionClient) -> AppResult<Vec<Message>> {
        let config = self.connector.config();

        let offset = match self.cursor.next {
            Some(offset) => offset,
            None => {
                let at = match config.start_offset {
                    StartOffset::Earliest => OffsetAt::Earliest,
                    StartOffset::Latest => OffsetAt::Latest,
                };
                client.get_offset(at).await?
            }
        };

        let max_wait_ms = i32::try_from(config.read_timeout.as_millis()).unwrap_or(i32::MAX);
        let fetched = client
            .fetch_records(
                offset,
                config.reader_min_bytes..config.reader_max_bytes,
                max_wait_ms,
            )
            .await;

        let (records, high_watermark) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                if is_offset_out_of_range(&e) {
                    tracing::warn!(
                        topic = %self.topic,
                        offset,
                        "Read offset no longer available, restarting from the configured start offset"
                    );
                    self.cursor.reset();
                }
                return Err(e.into());
            }
        };

        let messages = self.cursor.advance(offset, records);
        if !messages.is_empty() {
            tracing::debug!(
                count = messages.len(),
                next_offset = ?self.cursor.next,
                high_watermark,
                "Fetched user messages"
            );
        }
        Ok(messages)
    }
}

/// Read position within a partition; `None` until the start offset is resolved.
#[derive(Debug, Default)]
struct Cursor {
    next: Option<i64>,
}

impl Cursor {
    /// Keep the records at or past `requested` and move past the last one.
    fn advance(&mut self, requested: i64, records: Vec<RecordAndOffset>) -> Vec<Message> {
        let mut next = self.next.unwrap_or(requested).max(requested);
        let mut messages = Vec::with_capacity(records.len());
        for record in records {
            // Batches may start before the requested offset
            if record.offset < requested {
                continue;
            }
            next = next.max(record.offset + 1);
            messages.push(Message {
                offset: record.offset,
                payload: record.record.value.unwrap_or_default(),
            });
        }
        self.next = Some(next);
        messages
    }

    fn reset(&mut self) {
        self.next = None;
    }
}

fn is_offset_out_of_range(error: &KafkaError) -> bool {
    matches!(
        error,
        KafkaError::ServerError {
            protocol_error: ProtocolError::OffsetOutOfRange,
            ..
        }
    )
}

#[async_trait]
impl MessageSource for KafkaSource {
    async fn poll(&mut self) -> AppResult<Vec<Message>> {
        let client = match self.client.take() {
            Some(client) => client,
            None => self.connect().await?,
        };

        let messages = self.fetch(&client).await?;
        self.client = Some(client);
        Ok(messages)
    }
}
