//! Domain models for Orgboard.
//!
//! # Core Concepts
//!
//! Ownership is strictly tree-shaped:
//!
//! - [`Organization`]: Identity root for multi-tenancy. Owns projects.
//! - [`Project`]: A body of work inside one organization. Owns tasks.
//! - [`Task`]: A unit of work inside one project. Owns comments.
//! - [`Comment`]: Discussion attached to a task.
//!
//! Deleting a parent cascades through the whole subtree at the storage
//! layer, so there is no application-level cleanup loop.
//!
//! Every entity carries `created_at` / `updated_at` timestamps, set on
//! insert and refreshed on every update.

mod comment;
mod organization;
mod project;
mod stats;
mod task;

pub use comment::*;
pub use organization::*;
pub use project::*;
pub use stats::*;
pub use task::*;

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Used on nullable fields of update inputs: the outer `Option` is `None`
/// when the field was omitted (leave unchanged), `Some(None)` when the
/// client sent an explicit null (clear the field), and `Some(Some(v))`
/// when a value was supplied.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
