use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::commands::{self, MutationResult};
use crate::db::{Database, DbError};
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Translate a storage error into an HTTP response. Not-Found and
/// constraint/validation problems are safe to expose; anything else is
/// logged server-side and sanitized to a generic message.
fn error_response(e: DbError) -> (StatusCode, String) {
    match e {
        DbError::NotFound(entity) => (StatusCode::NOT_FOUND, format!("{} not found", entity)),
        DbError::Constraint(msg) | DbError::Validation(msg) => {
            tracing::warn!("Rejected request: {}", msg);
            (StatusCode::BAD_REQUEST, msg)
        }
        DbError::Sqlite(e) => {
            tracing::error!("Internal error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

/// Command envelopes always reach the client; a successful create gets a
/// 201, everything else (including handled failures) a 200.
fn mutation_response<T>(
    result: MutationResult<T>,
    created: StatusCode,
) -> (StatusCode, Json<MutationResult<T>>) {
    let status = if result.success {
        created
    } else {
        StatusCode::OK
    };
    (status, Json(result))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Organizations
// ============================================================

pub async fn list_organizations(
    State(db): State<Database>,
) -> Result<Json<Vec<Organization>>, (StatusCode, String)> {
    db.list_organizations().map(Json).map_err(error_response)
}

pub async fn get_organization(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Organization>, (StatusCode, String)> {
    db.get_organization(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Organization not found".to_string()))
}

pub async fn create_organization(
    State(db): State<Database>,
    Json(input): Json<CreateOrganizationInput>,
) -> (StatusCode, Json<MutationResult<Organization>>) {
    mutation_response(
        commands::create_organization(&db, input),
        StatusCode::CREATED,
    )
}

pub async fn delete_organization(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_organization(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Organization not found".to_string()))
    }
}

pub async fn get_project_stats(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectStats>, (StatusCode, String)> {
    db.project_stats(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Organization not found".to_string()))
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(
    State(db): State<Database>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<Vec<ProjectWithMetrics>>, (StatusCode, String)> {
    // Listing under a missing organization is a 404, not an empty list
    db.get_organization(organization_id)
        .map_err(error_response)?
        .ok_or((StatusCode::NOT_FOUND, "Organization not found".to_string()))?;

    db.list_projects_with_metrics(organization_id)
        .map(Json)
        .map_err(error_response)
}

pub async fn get_project(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectWithMetrics>, (StatusCode, String)> {
    db.get_project_with_metrics(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))
}

pub async fn create_project(
    State(db): State<Database>,
    Json(input): Json<CreateProjectInput>,
) -> (StatusCode, Json<MutationResult<Project>>) {
    mutation_response(commands::create_project(&db, input), StatusCode::CREATED)
}

pub async fn update_project(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProjectInput>,
) -> (StatusCode, Json<MutationResult<Project>>) {
    mutation_response(commands::update_project(&db, id, input), StatusCode::OK)
}

pub async fn delete_project(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_project(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Project not found".to_string()))
    }
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(
    State(db): State<Database>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    db.get_project(project_id)
        .map_err(error_response)?
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))?;

    db.list_tasks(project_id).map(Json).map_err(error_response)
}

pub async fn get_task(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, (StatusCode, String)> {
    db.get_task(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))
}

pub async fn create_task(
    State(db): State<Database>,
    Json(input): Json<CreateTaskInput>,
) -> (StatusCode, Json<MutationResult<Task>>) {
    mutation_response(commands::create_task(&db, input), StatusCode::CREATED)
}

pub async fn update_task(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> (StatusCode, Json<MutationResult<Task>>) {
    mutation_response(commands::update_task(&db, id, input), StatusCode::OK)
}

pub async fn delete_task(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_task(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Task not found".to_string()))
    }
}

// ============================================================
// Comments
// ============================================================

pub async fn list_comments(
    State(db): State<Database>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, (StatusCode, String)> {
    db.get_task(task_id)
        .map_err(error_response)?
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))?;

    db.list_comments(task_id).map(Json).map_err(error_response)
}

pub async fn create_comment(
    State(db): State<Database>,
    Json(input): Json<CreateCommentInput>,
) -> (StatusCode, Json<MutationResult<Comment>>) {
    mutation_response(commands::create_comment(&db, input), StatusCode::CREATED)
}

pub async fn delete_comment(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_comment(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Comment not found".to_string()))
    }
}
