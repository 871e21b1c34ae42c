//! Write-command surface.
//!
//! Each command validates its input, calls into the storage layer, and
//! reports the outcome as a [`MutationResult`]: the affected record on
//! success, or a list of human-readable errors on failure. Commands never
//! propagate raw storage failures to the caller; unexpected errors are
//! logged server-side and degrade to a generic message.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Database, DbError};
use crate::models::*;

/// Structured outcome of a write command.
///
/// `record` is present exactly when `success` is true; on failure the
/// `errors` list explains what went wrong. No partial update is ever
/// visible: a failed command leaves the store untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResult<T> {
    // An explicit default path keeps serde from requiring T: Default
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub record: Option<T>,
    pub success: bool,
    pub errors: Vec<String>,
}

impl<T> MutationResult<T> {
    fn ok(record: T) -> Self {
        Self {
            record: Some(record),
            success: true,
            errors: vec![],
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            record: None,
            success: false,
            errors: vec![message.into()],
        }
    }
}

fn failure<T>(e: DbError) -> MutationResult<T> {
    match e {
        DbError::NotFound(entity) => MutationResult::err(format!("{} not found", entity)),
        DbError::Constraint(msg) => MutationResult::err(constraint_message(&msg)),
        DbError::Validation(msg) => MutationResult::err(msg),
        DbError::Sqlite(e) => {
            tracing::error!("Command failed: {}", e);
            MutationResult::err("Internal server error")
        }
    }
}

/// Translate SQLite constraint messages into something a client can act on.
fn constraint_message(msg: &str) -> String {
    if msg.contains("projects.organization_id") && msg.contains("projects.name") {
        "A project with this name already exists in the organization".to_string()
    } else if msg.contains(".slug") {
        "Slug already in use".to_string()
    } else {
        msg.to_string()
    }
}

/// Required email fields must look like an address. Kept deliberately
/// loose: one `@` with text on both sides.
fn validate_email(field: &str, value: &str) -> Result<(), DbError> {
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DbError::Validation(format!(
            "{} is not a valid email address",
            field
        ))),
    }
}

pub fn create_organization(
    db: &Database,
    input: CreateOrganizationInput,
) -> MutationResult<Organization> {
    if let Err(e) = validate_email("contact_email", &input.contact_email) {
        return failure(e);
    }
    match db.create_organization(input) {
        Ok(org) => MutationResult::ok(org),
        Err(e) => failure(e),
    }
}

pub fn create_project(db: &Database, input: CreateProjectInput) -> MutationResult<Project> {
    match db.create_project(input) {
        Ok(project) => MutationResult::ok(project),
        Err(e) => failure(e),
    }
}

pub fn update_project(
    db: &Database,
    id: Uuid,
    input: UpdateProjectInput,
) -> MutationResult<Project> {
    match db.update_project(id, input) {
        Ok(Some(project)) => MutationResult::ok(project),
        Ok(None) => MutationResult::err("Project not found"),
        Err(e) => failure(e),
    }
}

pub fn create_task(db: &Database, input: CreateTaskInput) -> MutationResult<Task> {
    // Unassigned tasks carry an empty assignee
    if !input.assignee_email.is_empty() {
        if let Err(e) = validate_email("assignee_email", &input.assignee_email) {
            return failure(e);
        }
    }
    match db.create_task(input) {
        Ok(task) => MutationResult::ok(task),
        Err(e) => failure(e),
    }
}

pub fn update_task(db: &Database, id: Uuid, input: UpdateTaskInput) -> MutationResult<Task> {
    if let Some(assignee) = input.assignee_email.as_deref() {
        if !assignee.is_empty() {
            if let Err(e) = validate_email("assignee_email", assignee) {
                return failure(e);
            }
        }
    }
    match db.update_task(id, input) {
        Ok(Some(task)) => MutationResult::ok(task),
        Ok(None) => MutationResult::err("Task not found"),
        Err(e) => failure(e),
    }
}

pub fn create_comment(db: &Database, input: CreateCommentInput) -> MutationResult<Comment> {
    if let Err(e) = validate_email("author_email", &input.author_email) {
        return failure(e);
    }
    match db.create_comment(input) {
        Ok(comment) => MutationResult::ok(comment),
        Err(e) => failure(e),
    }
}
