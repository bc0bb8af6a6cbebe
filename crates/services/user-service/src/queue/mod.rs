//! Asynchronous user ingestion through Kafka.
//!
//! - [`KafkaPublisher`] forwards raw payloads to the user topic.
//! - [`UserListener`] consumes the topic and stores each decoded user.

mod balancer;
mod listener;
mod publisher;
mod source;

pub use balancer::LeastBytes;
pub use listener::UserListener;
pub use publisher::{KafkaPublisher, MessagePublisher};
pub use source::{KafkaSource, Message, MessageSource};

#[cfg(any(test, feature = "test-utils"))]
pub use publisher::MockMessagePublisher;
