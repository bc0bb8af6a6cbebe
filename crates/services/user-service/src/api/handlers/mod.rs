//! HTTP request handlers.

pub mod health_handler;
pub mod queue_handler;
pub mod user_handler;

pub use health_handler::health_routes;
pub use queue_handler::queue_routes;
pub use user_handler::user_routes;
