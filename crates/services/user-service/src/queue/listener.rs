//! Background listener applying user-topic messages to the store.

use std::collections::VecDeque;
use std::sync::Arc;

use common::{AppError, AppResult, RetryConfig};
use domain::User;

use super::{Message, MessageSource};
use crate::service::UserService;

/// Consumes user messages and inserts each one through the user service.
///
/// Malformed payloads are logged and skipped. Transient failures (fetch or
/// insert) are retried with exponential backoff; after `max_retries`
/// consecutive failures `run` returns the last error so the caller can stop
/// the process.
pub struct UserListener<S> {
    source: S,
    users: Arc<dyn UserService>,
    retry: RetryConfig,
}

impl<S: MessageSource> UserListener<S> {
    pub fn new(source: S, users: Arc<dyn UserService>, retry: RetryConfig) -> Self {
        Self {
            source,
            users,
            retry,
        }
    }

    /// Run until the retry budget is exhausted or a permanent failure occurs.
    pub async fn run(mut self) -> AppResult<()> {
        let mut pending: VecDeque<Message> = VecDeque::new();
        let mut failures = 0u32;

        loop {
            if pending.is_empty() {
                match self.source.poll().await {
                    Ok(batch) => {
                        failures = 0;
                        pending.extend(batch);
                    }
                    Err(e) => self.back_off(&mut failures, e).await?,
                }
                continue;
            }

            let message = &pending[0];
            match self.apply(message).await {
                Ok(()) => {
                    failures = 0;
                    pending.pop_front();
                }
                Err(e) if e.is_transient() => self.back_off(&mut failures, e).await?,
                Err(e) => {
                    tracing::error!(
                        offset = message.offset,
                        error = %e,
                        "Dropping user message that cannot be applied"
                    );
                    pending.pop_front();
                }
            }
        }
    }

    async fn apply(&self, message: &Message) -> AppResult<()> {
        let user: User = serde_json::from_slice(&message.payload)?;
        self.users.create_user(user).await?;
        Ok(())
    }

    async fn back_off(&self, failures: &mut u32, error: AppError) -> AppResult<()> {
        if !error.is_transient() {
            tracing::error!(error = %error, "User listener hit a permanent failure");
            return Err(error);
        }

        *failures += 1;
        if *failures > self.retry.max_retries {
            tracing::error!(
                attempts = *failures,
                error = %error,
                "User listener gave up after repeated failures"
            );
            return Err(error);
        }

        let delay = self.retry.backoff(*failures);
        tracing::warn!(
            attempt = *failures,
            max_retries = self.retry.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "User listener failure, retrying"
        );
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::service::MockUserService;

    /// Replays a fixed script, then fails with a transient error forever.
    struct ScriptedSource {
        script: VecDeque<AppResult<Vec<Message>>>,
        polls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<AppResult<Vec<Message>>>) -> (Self, Arc<AtomicUsize>) {
            let polls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                script: script.into(),
                polls: Arc::clone(&polls),
            };
            (source, polls)
        }
    }

    #[async_trait]
    impl MessageSource for ScriptedSource {
        async fn poll(&mut self) -> AppResult<Vec<Message>> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.script
                .pop_front()
                .unwrap_or_else(|| Err(AppError::timeout("broker unreachable")))
        }
    }

    fn message(offset: i64, payload: &str) -> Message {
        Message {
            offset,
            payload: payload.as_bytes().to_vec(),
        }
    }

    fn retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_inserts_decoded_users_and_skips_malformed_payloads() {
        let (source, _) = ScriptedSource::new(vec![Ok(vec![
            message(0, r#"{"Name":"Ann","Age":30}"#),
            message(1, "not json"),
            message(2, r#"{"Id":77,"Name":"Bob","Age":41}"#),
        ])]);

        let mut users = MockUserService::new();
        users
            .expect_create_user()
            .withf(|user| user.name == "Ann" || user.name == "Bob")
            .times(2)
            .returning(|user| Ok(user.with_id(1)));

        let result = UserListener::new(source, Arc::new(users), retry(0)).run().await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_retries_transient_insert_failures() {
        let (source, _) = ScriptedSource::new(vec![Ok(vec![message(0, r#"{"Name":"Ann","Age":30}"#)])]);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut users = MockUserService::new();
        users.expect_create_user().returning(move |user| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::timeout("database busy"))
            } else {
                Ok(user.with_id(5))
            }
        });

        let result = UserListener::new(source, Arc::new(users), retry(1)).run().await;
        assert!(result.is_err());
        // One failed attempt, one successful retry
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_budget() {
        let (source, polls) = ScriptedSource::new(vec![Ok(vec![]), Ok(vec![])]);
        let users = MockUserService::new();

        let result = UserListener::new(source, Arc::new(users), retry(3)).run().await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
        // Two empty batches, then the initial failure plus three retries
        assert_eq!(polls.load(Ordering::SeqCst), 2 + 4);
    }

    #[tokio::test]
    async fn test_permanent_insert_failure_skips_message() {
        let (source, _) = ScriptedSource::new(vec![Ok(vec![
            message(0, r#"{"Name":"Ann","Age":30}"#),
            message(1, r#"{"Name":"Bob","Age":41}"#),
        ])]);

        let mut users = MockUserService::new();
        users
            .expect_create_user()
            .times(2)
            .returning(|user| {
                if user.name == "Ann" {
                    Err(AppError::bad_request("rejected"))
                } else {
                    Ok(user.with_id(2))
                }
            });

        let result = UserListener::new(source, Arc::new(users), retry(0)).run().await;
        assert!(result.is_err());
    }
}
