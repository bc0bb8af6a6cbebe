//! Application state for dependency injection.

use std::sync::Arc;

use crate::queue::MessagePublisher;
use crate::service::UserService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// User use cases
    pub users: Arc<dyn UserService>,
    /// Publisher for the asynchronous ingestion path
    pub publisher: Arc<dyn MessagePublisher>,
    /// Topic the queue endpoint publishes to
    pub user_topic: String,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        users: Arc<dyn UserService>,
        publisher: Arc<dyn MessagePublisher>,
        user_topic: impl Into<String>,
    ) -> Self {
        Self {
            users,
            publisher,
            user_topic: user_topic.into(),
        }
    }
}
