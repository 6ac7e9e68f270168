//! Database models for recorded provider repositories.

use crate::types::{GroupId, RemoteId, RepositoryKind, RepositoryRecordId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the uniqueness constraint on `(directory_id, repository_id)`.
///
/// Recording the same provider repository twice must fail on this constraint rather than
/// silently create a duplicate.
pub const REPOSITORY_UNIQUE_CONSTRAINT: &str = "repositories_directory_repository_unique";

/// Database request for recording a provider repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCreateDBRequest {
    pub directory_id: RemoteId,
    pub repository_id: RemoteId,
    pub html_url: String,
    pub kind: RepositoryKind,
    /// Owning user for individual repositories
    pub user_id: Option<UserId>,
    /// Owning group for group repositories
    pub group_id: Option<GroupId>,
}

/// Database response for a recorded repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDBResponse {
    pub id: RepositoryRecordId,
    pub directory_id: RemoteId,
    pub repository_id: RemoteId,
    pub html_url: String,
    pub kind: RepositoryKind,
    pub user_id: Option<UserId>,
    pub group_id: Option<GroupId>,
    pub created_at: DateTime<Utc>,
}
