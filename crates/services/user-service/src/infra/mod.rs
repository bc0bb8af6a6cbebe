//! Infrastructure layer - database and message broker connections.

mod db;
mod kafka;

pub use db::Database;
pub use kafka::KafkaConnector;
