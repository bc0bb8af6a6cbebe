//! User repository implementation.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    FromQueryResult, NotSet, QueryFilter, QueryOrder, QueryTrait, Set,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::infra::Database;
use common::{AppError, AppResult};
use domain::User;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Result of a best-effort bulk read.
///
/// Rows that cannot be decoded are left out of `items` and counted in
/// `skipped`; a failing query fails the whole read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRead<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for BulkRead<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID; a missing row is `None`, not an error
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// List all users, skipping rows that fail to decode
    async fn list(&self) -> AppResult<BulkRead<User>>;

    /// Insert name/age and return the stored user with its assigned id
    async fn create(&self, user: User) -> AppResult<User>;

    /// Overwrite name/age of `user.id` (existence is not checked)
    async fn update(&self, user: User) -> AppResult<()>;

    /// Delete by ID; deleting a missing row is not an error
    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Delete every user, returning the number of removed rows
    async fn delete_all(&self) -> AppResult<u64>;

    /// Check store connectivity
    async fn ping(&self) -> AppResult<()>;
}

/// Log a failed store call with its context and convert it.
fn store_error(error: DbErr, operation: &'static str, id: Option<i32>) -> AppError {
    tracing::error!(operation, id = ?id, error = %error, "User store call failed");
    AppError::from(error)
}

/// Concrete implementation of UserRepository backed by SeaORM
pub struct UserStore {
    db: Database,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(self.db.connection())
            .await
            .map_err(|e| store_error(e, "get user by id", Some(id)))?;

        Ok(result.map(User::from))
    }

    async fn list(&self) -> AppResult<BulkRead<User>> {
        let conn = self.db.connection();
        let statement = UserEntity::find()
            .order_by_asc(user::Column::Id)
            .build(conn.get_database_backend());
        let rows = conn
            .query_all(statement)
            .await
            .map_err(|e| store_error(e, "get all users", None))?;

        let mut read = BulkRead::default();
        for row in rows {
            match user::Model::from_query_result(&row, "") {
                Ok(model) => read.items.push(User::from(model)),
                Err(e) => {
                    read.skipped += 1;
                    tracing::warn!(error = %e, "Skipping user row that failed to decode");
                }
            }
        }

        Ok(read)
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let active_model = ActiveModel {
            id: NotSet,
            name: Set(user.name),
            age: Set(user.age),
        };

        let model = active_model
            .insert(self.db.connection())
            .await
            .map_err(|e| store_error(e, "add user", None))?;
        Ok(User::from(model))
    }

    async fn update(&self, user: User) -> AppResult<()> {
        let user_id = user.id;
        UserEntity::update_many()
            .col_expr(user::Column::Name, Expr::value(user.name))
            .col_expr(user::Column::Age, Expr::value(user.age))
            .filter(user::Column::Id.eq(user.id))
            .exec(self.db.connection())
            .await
            .map_err(|e| store_error(e, "update user", Some(user_id)))?;

        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        UserEntity::delete_by_id(id)
            .exec(self.db.connection())
            .await
            .map_err(|e| store_error(e, "delete user", Some(id)))?;

        Ok(())
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let result = UserEntity::delete_many()
            .exec(self.db.connection())
            .await
            .map_err(|e| store_error(e, "delete all users", None))?;

        Ok(result.rows_affected)
    }

    async fn ping(&self) -> AppResult<()> {
        self.db.ping().await.map_err(|e| store_error(e, "ping", None))
    }
}
