//! OpenAPI documentation.

use utoipa::OpenApi;

use domain::User;

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::user_handler::get_user,
        crate::api::handlers::user_handler::list_users,
        crate::api::handlers::user_handler::create_user,
        crate::api::handlers::user_handler::update_user,
        crate::api::handlers::user_handler::delete_user,
        crate::api::handlers::user_handler::delete_all_users,
        crate::api::handlers::queue_handler::publish_user,
    ),
    components(schemas(User)),
    tags(
        (name = "Users", description = "User management endpoints"),
        (name = "Queue", description = "Asynchronous user ingestion"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_schema_carries_examples() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let user = &doc["components"]["schemas"]["User"];

        assert_eq!(user["properties"]["Name"]["example"], "TEST");
        assert_eq!(user["properties"]["Age"]["example"], 14);
    }

    #[test]
    fn test_documents_user_and_queue_routes() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();

        for path in ["/users", "/users/{id}", "/queue/users"] {
            assert!(paths.contains_key(path), "{path}");
        }
    }
}
