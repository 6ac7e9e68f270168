//! API request/response models for student groups.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::{groups::GroupDBResponse, users::UserDBResponse};
use crate::provisioning::ProvisionOutcome;
use crate::types::{CourseId, GroupId, GroupStatus, RemoteId, RepositoryRecordId, UserId};

/// Request body for changing a group's status, which provisions its repository and team.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupStatusUpdate {
    /// Requested status: 0 pending, 1 rejected, 2 approved, 3 teacher
    #[schema(example = 2)]
    pub status: i64,
}

/// A group member. Provider credentials are never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupMemberResponse {
    pub id: UserId,
    pub name: String,
    /// Providers the member has linked
    pub providers: Vec<String>,
}

impl From<UserDBResponse> for GroupMemberResponse {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            name: user.name,
            providers: user.remote_identities.into_iter().map(|identity| identity.provider).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: GroupId,
    pub name: String,
    pub course_id: CourseId,
    pub status: GroupStatus,
    /// Members in enrollment order
    pub members: Vec<GroupMemberResponse>,
}

impl From<GroupDBResponse> for GroupResponse {
    fn from(group: GroupDBResponse) -> Self {
        Self {
            id: group.id,
            name: group.name,
            course_id: group.course_id,
            status: group.status,
            members: group.members.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProvisionedRepository {
    /// Provider repository id
    pub id: RemoteId,
    pub path: String,
    pub web_url: String,
    /// False when an existing repository was reused
    pub created: bool,
    /// Id of the local repository record
    pub record_id: RepositoryRecordId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProvisionedTeam {
    pub id: RemoteId,
    pub name: String,
    /// Provider usernames
    pub members: Vec<String>,
}

/// Result of a successful status change
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupProvisionResponse {
    pub group_id: GroupId,
    pub status: GroupStatus,
    pub repository: ProvisionedRepository,
    pub team: ProvisionedTeam,
}

impl GroupProvisionResponse {
    pub fn new(group_id: GroupId, outcome: ProvisionOutcome) -> Self {
        Self {
            group_id,
            status: outcome.status,
            repository: ProvisionedRepository {
                id: outcome.repository.id,
                path: outcome.repository.path,
                web_url: outcome.repository.web_url,
                created: outcome.repository_created,
                record_id: outcome.record.id,
            },
            team: ProvisionedTeam {
                id: outcome.team.id,
                name: outcome.team.name,
                members: outcome.team.members,
            },
        }
    }
}
