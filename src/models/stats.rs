use serde::{Deserialize, Serialize};

/// Organization-scoped aggregate counters.
///
/// Computed on demand from current state under a single connection lock,
/// so all counters come from one snapshot of the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStats {
    pub total_projects: i64,
    pub active_projects: i64,
    pub completed_projects: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    /// Percentage of tasks that are done across the whole organization,
    /// in `[0, 100]`. Defined as 0 when there are no tasks.
    pub overall_completion_rate: f64,
}
