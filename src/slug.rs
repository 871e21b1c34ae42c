//! Slug generation.
//!
//! Slugs are computed exactly once, at creation time, from a deterministic
//! function of other fields. They are never regenerated on update, so
//! renaming an entity does not change its slug.

use chrono::{DateTime, Utc};

/// Turn arbitrary text into a URL-safe slug: lowercase alphanumerics with
/// single `-` separators, no leading or trailing separator.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.extend(c.to_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Slug for an organization, derived from name, contact email and creation
/// time. The timestamp keeps same-named organizations distinct.
pub fn organization_slug(name: &str, contact_email: &str, created_at: DateTime<Utc>) -> String {
    slugify(&format!(
        "{} {} {}",
        name,
        contact_email,
        created_at.to_rfc3339()
    ))
}

/// Slug for a project, derived from its name and the owning organization's
/// name.
pub fn project_slug(name: &str, organization_name: &str) -> String {
    slugify(&format!("{} {}", name, organization_name))
}

/// Slug for a task, derived from its title and the owning project's name.
/// Task slugs are not required to be unique.
pub fn task_slug(title: &str, project_name: &str) -> String {
    slugify(&format!("{} {}", title, project_name))
}
