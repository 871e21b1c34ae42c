mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Organizations
        .route("/organizations", get(handlers::list_organizations))
        .route("/organizations", post(handlers::create_organization))
        .route("/organizations/{id}", get(handlers::get_organization))
        .route("/organizations/{id}", delete(handlers::delete_organization))
        .route("/organizations/{id}/projects", get(handlers::list_projects))
        .route("/organizations/{id}/stats", get(handlers::get_project_stats))
        // Projects
        .route("/projects", post(handlers::create_project))
        .route("/projects/{id}", get(handlers::get_project))
        .route("/projects/{id}", put(handlers::update_project))
        .route("/projects/{id}", delete(handlers::delete_project))
        .route("/projects/{id}/tasks", get(handlers::list_tasks))
        // Tasks
        .route("/tasks", post(handlers::create_task))
        .route("/tasks/{id}", get(handlers::get_task))
        .route("/tasks/{id}", put(handlers::update_task))
        .route("/tasks/{id}", delete(handlers::delete_task))
        .route("/tasks/{id}/comments", get(handlers::list_comments))
        // Comments
        .route("/comments", post(handlers::create_comment))
        .route("/comments/{id}", delete(handlers::delete_comment))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
