use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An organization, the identity root for multi-tenancy.
///
/// Every project belongs to exactly one organization. Deleting an
/// organization removes all of its projects, their tasks, and those
/// tasks' comments in a single cascading statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub contact_email: String,
    /// URL-safe identifier derived from name, contact email and creation
    /// time. Generated once at creation and unique across organizations.
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganizationInput {
    pub name: String,
    pub contact_email: String,
}
