mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;
use crate::slug;

/// Storage-layer error, classified for the command surface.
#[derive(Debug, Error)]
pub enum DbError {
    /// A requested or referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A storage-level invariant was violated (uniqueness, foreign key).
    #[error("{0}")]
    Constraint(String),
    /// Input was rejected before reaching the storage engine.
    #[error("{0}")]
    Validation(String),
    /// Any other storage failure.
    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, msg)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::Constraint(
                    msg.clone()
                        .unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            _ => DbError::Sqlite(e),
        }
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        // Cascading deletes depend on this pragma, which is per-connection
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "orgboard")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("orgboard.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Organization operations
    // ============================================================

    pub fn list_organizations(&self) -> DbResult<Vec<Organization>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, contact_email, slug, created_at, updated_at
             FROM organizations ORDER BY name",
        )?;

        let organizations = stmt
            .query_map([], organization_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(organizations)
    }

    pub fn get_organization(&self, id: Uuid) -> DbResult<Option<Organization>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, contact_email, slug, created_at, updated_at
             FROM organizations WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(organization_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn create_organization(&self, input: CreateOrganizationInput) -> DbResult<Organization> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let slug = slug::organization_slug(&input.name, &input.contact_email, now);

        conn.execute(
            "INSERT INTO organizations (id, name, contact_email, slug, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.contact_email,
                &slug,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Organization {
            id,
            name: input.name,
            contact_email: input.contact_email,
            slug,
            created_at: now,
            updated_at: now,
        })
    }

    /// Delete an organization and, through storage-level cascade rules,
    /// every project, task and comment under it. A single statement, so a
    /// failure mid-way cannot leave orphaned children.
    pub fn delete_organization(&self, id: Uuid) -> DbResult<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM organizations WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn list_projects(&self, organization_id: Uuid) -> DbResult<Vec<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, organization_id, name, description, status, due_date, slug, created_at, updated_at
             FROM projects WHERE organization_id = ? ORDER BY created_at DESC, rowid DESC",
        )?;

        let projects = stmt
            .query_map([organization_id.to_string()], project_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    pub fn get_project(&self, id: Uuid) -> DbResult<Option<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, organization_id, name, description, status, due_date, slug, created_at, updated_at
             FROM projects WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(project_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn create_project(&self, input: CreateProjectInput) -> DbResult<Project> {
        // Verify the owning organization exists; also needed for the slug
        let organization = self
            .get_organization(input.organization_id)?
            .ok_or(DbError::NotFound("Organization"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let status = input.status.unwrap_or_default();
        let slug = slug::project_slug(&input.name, &organization.name);

        conn.execute(
            "INSERT INTO projects (id, organization_id, name, description, status, due_date, slug, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.organization_id.to_string(),
                &input.name,
                &input.description,
                status.as_str(),
                input.due_date.map(|d| d.to_string()),
                &slug,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Project {
            id,
            organization_id: input.organization_id,
            name: input.name,
            description: input.description,
            status,
            due_date: input.due_date,
            slug,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Supplied fields are written, absent fields
    /// are left alone; the slug never changes. All changes land in one
    /// UPDATE statement.
    pub fn update_project(&self, id: Uuid, input: UpdateProjectInput) -> DbResult<Option<Project>> {
        let Some(existing) = self.get_project(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.unwrap_or(existing.description);
        let status = input.status.unwrap_or(existing.status);
        let due_date = match input.due_date {
            Some(value) => value,
            None => existing.due_date,
        };

        conn.execute(
            "UPDATE projects SET name = ?, description = ?, status = ?, due_date = ?, updated_at = ? WHERE id = ?",
            (
                &name,
                &description,
                status.as_str(),
                due_date.map(|d| d.to_string()),
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Some(Project {
            id,
            organization_id: existing.organization_id,
            name,
            description,
            status,
            due_date,
            slug: existing.slug,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_project(&self, id: Uuid) -> DbResult<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM projects WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Derived metrics
    // ============================================================

    pub fn get_project_with_metrics(&self, id: Uuid) -> DbResult<Option<ProjectWithMetrics>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, organization_id, name, description, status, due_date, slug, created_at, updated_at
             FROM projects WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let project = project_from_row(row)?;
        drop(rows);
        drop(stmt);

        let (task_count, completed_task_count) = task_counts(&conn, project.id)?;
        Ok(Some(ProjectWithMetrics {
            project,
            task_count,
            completed_task_count,
            completion_rate: completion_rate(completed_task_count, task_count),
        }))
    }

    pub fn list_projects_with_metrics(
        &self,
        organization_id: Uuid,
    ) -> DbResult<Vec<ProjectWithMetrics>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, organization_id, name, description, status, due_date, slug, created_at, updated_at
             FROM projects WHERE organization_id = ? ORDER BY created_at DESC, rowid DESC",
        )?;

        let projects = stmt
            .query_map([organization_id.to_string()], project_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        drop(stmt);

        let mut out = Vec::with_capacity(projects.len());
        for project in projects {
            let (task_count, completed_task_count) = task_counts(&conn, project.id)?;
            out.push(ProjectWithMetrics {
                project,
                task_count,
                completed_task_count,
                completion_rate: completion_rate(completed_task_count, task_count),
            });
        }

        Ok(out)
    }

    /// Organization-wide aggregate counters. All counts run under one
    /// connection lock, so they reflect a single snapshot of the data.
    pub fn project_stats(&self, organization_id: Uuid) -> DbResult<Option<ProjectStats>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let org = organization_id.to_string();

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM organizations WHERE id = ?",
            [&org],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(None);
        }

        let total_projects: i64 = conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE organization_id = ?",
            [&org],
            |row| row.get(0),
        )?;
        let active_projects: i64 = conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE organization_id = ? AND status = 'active'",
            [&org],
            |row| row.get(0),
        )?;
        let completed_projects: i64 = conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE organization_id = ? AND status = 'completed'",
            [&org],
            |row| row.get(0),
        )?;
        let total_tasks: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tasks
             JOIN projects ON tasks.project_id = projects.id
             WHERE projects.organization_id = ?",
            [&org],
            |row| row.get(0),
        )?;
        let completed_tasks: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tasks
             JOIN projects ON tasks.project_id = projects.id
             WHERE projects.organization_id = ? AND tasks.status = 'done'",
            [&org],
            |row| row.get(0),
        )?;

        Ok(Some(ProjectStats {
            total_projects,
            active_projects,
            completed_projects,
            total_tasks,
            completed_tasks,
            overall_completion_rate: completion_rate(completed_tasks, total_tasks),
        }))
    }

    // ============================================================
    // Task operations
    // ============================================================

    pub fn list_tasks(&self, project_id: Uuid) -> DbResult<Vec<Task>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, description, status, assignee_email, due_date, slug, created_at, updated_at
             FROM tasks WHERE project_id = ? ORDER BY created_at DESC, rowid DESC",
        )?;

        let tasks = stmt
            .query_map([project_id.to_string()], task_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    pub fn get_task(&self, id: Uuid) -> DbResult<Option<Task>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, description, status, assignee_email, due_date, slug, created_at, updated_at
             FROM tasks WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(task_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn create_task(&self, input: CreateTaskInput) -> DbResult<Task> {
        // Verify the owning project exists; also needed for the slug
        let project = self
            .get_project(input.project_id)?
            .ok_or(DbError::NotFound("Project"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let status = input.status.unwrap_or_default();
        let slug = slug::task_slug(&input.title, &project.name);

        conn.execute(
            "INSERT INTO tasks (id, project_id, title, description, status, assignee_email, due_date, slug, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.project_id.to_string(),
                &input.title,
                &input.description,
                status.as_str(),
                &input.assignee_email,
                input.due_date.map(|d| d.to_rfc3339()),
                &slug,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Task {
            id,
            project_id: input.project_id,
            title: input.title,
            description: input.description,
            status,
            assignee_email: input.assignee_email,
            due_date: input.due_date,
            slug,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Supplied fields are written, absent fields
    /// are left alone; the slug never changes. All changes land in one
    /// UPDATE statement.
    pub fn update_task(&self, id: Uuid, input: UpdateTaskInput) -> DbResult<Option<Task>> {
        let Some(existing) = self.get_task(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let title = input.title.unwrap_or(existing.title);
        let description = input.description.unwrap_or(existing.description);
        let status = input.status.unwrap_or(existing.status);
        let assignee_email = input.assignee_email.unwrap_or(existing.assignee_email);
        let due_date = match input.due_date {
            Some(value) => value,
            None => existing.due_date,
        };

        conn.execute(
            "UPDATE tasks SET title = ?, description = ?, status = ?, assignee_email = ?, due_date = ?, updated_at = ? WHERE id = ?",
            (
                &title,
                &description,
                status.as_str(),
                &assignee_email,
                due_date.map(|d| d.to_rfc3339()),
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Some(Task {
            id,
            project_id: existing.project_id,
            title,
            description,
            status,
            assignee_email,
            due_date,
            slug: existing.slug,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_task(&self, id: Uuid) -> DbResult<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Comment operations
    // ============================================================

    pub fn list_comments(&self, task_id: Uuid) -> DbResult<Vec<Comment>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, task_id, content, author_email, created_at, updated_at
             FROM comments WHERE task_id = ? ORDER BY created_at DESC, rowid DESC",
        )?;

        let comments = stmt
            .query_map([task_id.to_string()], comment_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    pub fn create_comment(&self, input: CreateCommentInput) -> DbResult<Comment> {
        // Verify the owning task exists
        self.get_task(input.task_id)?
            .ok_or(DbError::NotFound("Task"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO comments (id, task_id, content, author_email, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.task_id.to_string(),
                &input.content,
                &input.author_email,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Comment {
            id,
            task_id: input.task_id,
            content: input.content,
            author_email: input.author_email,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn delete_comment(&self, id: Uuid) -> DbResult<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM comments WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

// ============================================================
// Row mapping
// ============================================================

fn organization_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        contact_email: row.get(2)?,
        slug: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: parse_uuid(row.get::<_, String>(0)?),
        organization_id: parse_uuid(row.get::<_, String>(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        status: ProjectStatus::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(ProjectStatus::Active),
        due_date: row.get::<_, Option<String>>(5)?.and_then(|s| s.parse().ok()),
        slug: row.get(6)?,
        created_at: parse_datetime(row.get::<_, String>(7)?),
        updated_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: parse_uuid(row.get::<_, String>(0)?),
        project_id: parse_uuid(row.get::<_, String>(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(TaskStatus::Todo),
        assignee_email: row.get(5)?,
        due_date: row.get::<_, Option<String>>(6)?.map(parse_datetime),
        slug: row.get(7)?,
        created_at: parse_datetime(row.get::<_, String>(8)?),
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

fn comment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: parse_uuid(row.get::<_, String>(0)?),
        task_id: parse_uuid(row.get::<_, String>(1)?),
        content: row.get(2)?,
        author_email: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn task_counts(conn: &Connection, project_id: Uuid) -> rusqlite::Result<(i64, i64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE project_id = ?",
        [project_id.to_string()],
        |row| row.get(0),
    )?;
    let completed: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE project_id = ? AND status = 'done'",
        [project_id.to_string()],
        |row| row.get(0),
    )?;
    Ok((total, completed))
}

fn completion_rate(completed: i64, total: i64) -> f64 {
    if total > 0 {
        completed as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
