//! Domain layer - Core business entities.
//!
//! This crate contains the User entity and the constants shared by the
//! HTTP surface and the queue ingestion path. It has no infrastructure
//! dependencies.

pub mod constants;
pub mod user;

pub use constants::*;
pub use user::User;
