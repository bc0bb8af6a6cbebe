//! User Service Library
//!
//! CRUD over a single User entity, served over HTTP and backed by
//! PostgreSQL, plus an asynchronous ingestion path through a Kafka topic.

pub mod api;
pub mod config;
pub mod infra;
pub mod queue;
pub mod repository;
pub mod service;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::api::{create_router, AppState};
use crate::config::UserServiceConfig;
use crate::infra::{Database, KafkaConnector};
use crate::queue::{KafkaPublisher, KafkaSource, UserListener};
use crate::repository::UserStore;
use crate::service::{UserManager, UserService};

/// Run the user service with configuration from the environment.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    run_server_with_config(UserServiceConfig::from_env()).await
}

/// Run the HTTP server and the user listener until either stops.
///
/// The listener only stops after exhausting its retry budget; that is
/// reported as an error so the process exits.
pub async fn run_server_with_config(
    config: UserServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database).await?;

    // Create repository and service
    let user_repo = Arc::new(UserStore::new(db));
    let user_service: Arc<dyn UserService> = Arc::new(UserManager::new(user_repo));

    // Kafka is contacted lazily by both sides
    let connector = Arc::new(KafkaConnector::new(config.queue.clone()));
    let publisher = Arc::new(KafkaPublisher::new(Arc::clone(&connector)));
    let listener = UserListener::new(
        KafkaSource::new(Arc::clone(&connector)),
        Arc::clone(&user_service),
        config.queue.retry.clone(),
    );
    let listener_handle = tokio::spawn(listener.run());

    // Build router
    let state = AppState::new(user_service, publisher, config.queue.topic.clone());
    let app = create_router(state);

    // Build address
    let addr: SocketAddr = config.server.addr().parse()?;
    info!("User service listening on {}", addr);

    let tcp = tokio::net::TcpListener::bind(addr).await?;

    tokio::select! {
        served = axum::serve(tcp, app).into_future() => {
            served?;
            warn!("HTTP server stopped");
        }
        finished = listener_handle => {
            match finished {
                Ok(Ok(())) => warn!("User listener stopped"),
                Ok(Err(e)) => {
                    error!("User listener failed: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    error!("User listener task aborted: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
