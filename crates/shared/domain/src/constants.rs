//! Domain-level constants.

// =============================================================================
// Messaging
// =============================================================================

/// Default topic carrying user-creation events
pub const USER_TOPIC: &str = "user-topic";

/// Default partition the ingestion listener reads
pub const USER_TOPIC_PARTITION: i32 = 0;
