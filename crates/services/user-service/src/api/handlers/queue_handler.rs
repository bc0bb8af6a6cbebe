//! Queue handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Router,
};

use common::AppResult;

use crate::api::state::AppState;

/// Create queue routes
pub fn queue_routes() -> Router<AppState> {
    Router::new().route("/users", post(publish_user))
}

/// Forward the raw request body to the user topic
///
/// The body is not validated here; the listener decodes it on arrival.
#[utoipa::path(
    post,
    path = "/queue/users",
    tag = "Queue",
    request_body(content = String, description = "User JSON, forwarded unchanged", content_type = "application/json"),
    responses(
        (status = 200, description = "Message published", body = String),
        (status = 500, description = "Message queue failure", body = String)
    )
)]
pub async fn publish_user(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, &'static str)> {
    state
        .publisher
        .publish(&state.user_topic, body.to_vec())
        .await?;

    Ok((StatusCode::OK, "User was sent via queue"))
}
