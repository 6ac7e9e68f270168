//! Database models for courses.

use crate::types::{CourseId, RemoteId};
use serde::{Deserialize, Serialize};

/// Database response for a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseDBResponse {
    pub id: CourseId,
    pub name: String,
    /// Name of the hosting provider all course repositories live on
    pub provider: String,
    /// Provider id of the directory (organisation/namespace) holding the course repositories
    pub directory_id: RemoteId,
}
