//! Database models for student groups.

use crate::db::models::users::UserDBResponse;
use crate::types::{CourseId, GroupId, GroupStatus};
use serde::{Deserialize, Serialize};

/// Database request for creating a group
#[derive(Debug, Clone)]
pub struct GroupCreateDBRequest {
    pub name: String,
    pub course_id: CourseId,
    pub status: GroupStatus,
    /// Member ids in enrollment order
    pub members: Vec<crate::types::UserId>,
}

/// Database response for a group, with members resolved in enrollment order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDBResponse {
    pub id: GroupId,
    pub name: String,
    pub course_id: CourseId,
    pub status: GroupStatus,
    pub members: Vec<UserDBResponse>,
}
