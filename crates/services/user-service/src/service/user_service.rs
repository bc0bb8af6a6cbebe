//! User service - Handles user-related business logic.
//!
//! Translates missing records into not-found errors and guards updates with
//! an existence check; everything else is delegated to the repository.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppResult, OptionExt};
use domain::User;

use crate::repository::UserRepository;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, id: u64) -> AppResult<User>;

    /// List all users
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Store a new user; any id on the input is ignored
    async fn create_user(&self, user: User) -> AppResult<User>;

    /// Replace name/age of an existing user
    async fn update_user(&self, id: u64, user: User) -> AppResult<User>;

    /// Delete user (idempotent)
    async fn delete_user(&self, id: u64) -> AppResult<()>;

    /// Delete every user
    async fn delete_all_users(&self) -> AppResult<u64>;

    /// Check that the backing store is reachable
    async fn health(&self) -> AppResult<()>;
}

/// Not-found message for a user id
fn missing_user(id: u64) -> String {
    format!("There is no user with id = '{}'", id)
}

/// Key of the row that could hold `id`; ids past the serial range have none.
fn store_key(id: u64) -> Option<i32> {
    i32::try_from(id).ok()
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_user(&self, id: u64) -> AppResult<User> {
        let key = store_key(id).ok_or_not_found(missing_user(id))?;
        self.repo
            .find_by_id(key)
            .await?
            .ok_or_not_found(missing_user(id))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let read = self.repo.list().await?;
        if read.skipped > 0 {
            tracing::warn!(
                skipped = read.skipped,
                returned = read.items.len(),
                "Bulk user read skipped undecodable rows"
            );
        }
        Ok(read.items)
    }

    async fn create_user(&self, user: User) -> AppResult<User> {
        let stored = self.repo.create(user).await?;
        tracing::info!(id = stored.id, "Created {}", stored);
        Ok(stored)
    }

    async fn update_user(&self, id: u64, user: User) -> AppResult<User> {
        // Existence check happens before any write
        let key = store_key(id).ok_or_not_found(missing_user(id))?;
        self.repo
            .find_by_id(key)
            .await?
            .ok_or_not_found(missing_user(id))?;

        let user = user.with_id(key);
        self.repo.update(user.clone()).await?;
        tracing::info!(id, "Updated {}", user);
        Ok(user)
    }

    async fn delete_user(&self, id: u64) -> AppResult<()> {
        let Some(key) = store_key(id) else {
            tracing::debug!(id, "No stored user can carry this id, nothing to delete");
            return Ok(());
        };
        self.repo.delete(key).await?;
        tracing::info!(id, "Deleted user");
        Ok(())
    }

    async fn delete_all_users(&self) -> AppResult<u64> {
        let removed = self.repo.delete_all().await?;
        tracing::info!(removed, "Deleted all users");
        Ok(removed)
    }

    async fn health(&self) -> AppResult<()> {
        self.repo.ping().await
    }
}
