//! User handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use common::AppResult;
use domain::User;

use crate::api::extractors::{decode_json, JsonBody, UserId};
use crate::api::state::AppState;

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_users).post(create_user).delete(delete_all_users),
        )
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User record", body = User),
        (status = 400, description = "Malformed id", body = String),
        (status = 404, description = "User not found", body = String),
        (status = 500, description = "Database failure", body = String)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> AppResult<Json<User>> {
    let user = state.users.get_user(id).await?;
    Ok(Json(user))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 500, description = "Database failure", body = String)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.users.list_users().await?;
    Ok(Json(users))
}

/// Create a user; the id is assigned by the store
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = User,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Malformed JSON body", body = String),
        (status = 500, description = "Database failure", body = String)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(user): JsonBody<User>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.users.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Replace name and age of an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = u64, Path, description = "User ID")
    ),
    request_body = User,
    responses(
        (status = 200, description = "User updated", body = String),
        (status = 400, description = "Malformed id or JSON body", body = String),
        (status = 404, description = "User not found", body = String),
        (status = 500, description = "Database failure", body = String)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    body: Bytes,
) -> AppResult<(StatusCode, String)> {
    let user: User = match decode_json(&body) {
        Ok(user) => user,
        Err(e) => {
            // A missing user is reported ahead of a malformed body
            state.users.get_user(id).await?;
            return Err(e);
        }
    };
    state.users.update_user(id, user).await?;

    Ok((StatusCode::OK, format!("User with id = '{}' was updated", id)))
}

/// Delete user by ID (deleting a missing user succeeds)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = String),
        (status = 400, description = "Malformed id", body = String),
        (status = 500, description = "Database failure", body = String)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> AppResult<(StatusCode, String)> {
    state.users.delete_user(id).await?;
    Ok((StatusCode::OK, format!("User with id = '{}' was deleted", id)))
}

/// Delete all users
#[utoipa::path(
    delete,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users deleted", body = String),
        (status = 500, description = "Database failure", body = String)
    )
)]
pub async fn delete_all_users(State(state): State<AppState>) -> AppResult<(StatusCode, String)> {
    state.users.delete_all_users().await?;
    Ok((StatusCode::OK, "All users were deleted".to_string()))
}
