//! In-memory store implementation.
//!
//! Keeps every table in a single lock-protected state. It enforces the same uniqueness and
//! reference constraints as the PostgreSQL schema, so workflows behave identically against it.
//! Suitable for tests and local development; data is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::db::{
    Store,
    errors::{DbError, Result},
    models::{
        courses::CourseDBResponse,
        groups::{GroupCreateDBRequest, GroupDBResponse},
        repositories::{REPOSITORY_UNIQUE_CONSTRAINT, RepositoryCreateDBRequest, RepositoryDBResponse},
        users::UserDBResponse,
    },
};
use crate::types::{CourseId, GroupId, GroupStatus, UserId};

/// Stored group row; members are kept as ids and resolved on read.
#[derive(Clone)]
struct StoredGroup {
    name: String,
    course_id: CourseId,
    status: GroupStatus,
    members: Vec<UserId>,
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, UserDBResponse>,
    courses: HashMap<CourseId, CourseDBResponse>,
    groups: HashMap<GroupId, StoredGroup>,
    repositories: Vec<RepositoryDBResponse>,
    next_group_id: GroupId,
    next_repository_id: i64,
}

/// In-memory implementation of the [`Store`] trait.
///
/// # Example
/// ```ignore
/// let store = InMemoryStore::new();
/// store.insert_user(user)?;
/// store.insert_course(course);
/// let group_id = store.insert_group(GroupCreateDBRequest { .. })?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    ///
    /// # Errors
    /// - `UniqueViolation` if the user links the same provider more than once
    pub fn insert_user(&self, user: UserDBResponse) -> Result<()> {
        for (i, identity) in user.remote_identities.iter().enumerate() {
            if user.remote_identities[..i].iter().any(|other| other.provider == identity.provider) {
                return Err(DbError::UniqueViolation {
                    constraint: Some("remote_identities_user_provider_unique".to_string()),
                    table: Some("remote_identities".to_string()),
                    message: format!("user {} already linked to provider {}", user.id, identity.provider),
                });
            }
        }
        self.state.write().users.insert(user.id, user);
        Ok(())
    }

    pub fn insert_course(&self, course: CourseDBResponse) {
        self.state.write().courses.insert(course.id, course);
    }

    /// Create a group and return its id.
    ///
    /// # Errors
    /// - `ForeignKeyViolation` if the course or a member does not exist
    /// - `UniqueViolation` if the course already has a group with this name
    pub fn insert_group(&self, request: GroupCreateDBRequest) -> Result<GroupId> {
        let mut state = self.state.write();

        if !state.courses.contains_key(&request.course_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("groups_course_id_fkey".to_string()),
                table: Some("groups".to_string()),
                message: format!("course {} does not exist", request.course_id),
            });
        }
        if let Some(missing) = request.members.iter().find(|id| !state.users.contains_key(*id)) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("group_users_user_id_fkey".to_string()),
                table: Some("group_users".to_string()),
                message: format!("user {missing} does not exist"),
            });
        }
        if state
            .groups
            .values()
            .any(|group| group.course_id == request.course_id && group.name == request.name)
        {
            return Err(DbError::UniqueViolation {
                constraint: Some("groups_course_name_unique".to_string()),
                table: Some("groups".to_string()),
                message: format!("group {} already exists in course {}", request.name, request.course_id),
            });
        }

        state.next_group_id += 1;
        let id = state.next_group_id;
        state.groups.insert(
            id,
            StoredGroup {
                name: request.name,
                course_id: request.course_id,
                status: request.status,
                members: request.members,
            },
        );
        Ok(id)
    }

    /// Snapshot of all recorded repositories, in insertion order
    pub fn repositories(&self) -> Vec<RepositoryDBResponse> {
        self.state.read().repositories.clone()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<GroupDBResponse>> {
        let state = self.state.read();
        Ok(state.groups.get(&id).map(|group| GroupDBResponse {
            id,
            name: group.name.clone(),
            course_id: group.course_id,
            status: group.status,
            members: group
                .members
                .iter()
                .filter_map(|user_id| state.users.get(user_id).cloned())
                .collect(),
        }))
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<CourseDBResponse>> {
        Ok(self.state.read().courses.get(&id).cloned())
    }

    async fn create_repository(&self, request: &RepositoryCreateDBRequest) -> Result<RepositoryDBResponse> {
        let mut state = self.state.write();

        if state
            .repositories
            .iter()
            .any(|repo| repo.directory_id == request.directory_id && repo.repository_id == request.repository_id)
        {
            return Err(DbError::UniqueViolation {
                constraint: Some(REPOSITORY_UNIQUE_CONSTRAINT.to_string()),
                table: Some("repositories".to_string()),
                message: format!(
                    "repository {} already recorded for directory {}",
                    request.repository_id, request.directory_id
                ),
            });
        }
        if let Some(group_id) = request.group_id
            && !state.groups.contains_key(&group_id)
        {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("repositories_group_id_fkey".to_string()),
                table: Some("repositories".to_string()),
                message: format!("group {group_id} does not exist"),
            });
        }

        state.next_repository_id += 1;
        let record = RepositoryDBResponse {
            id: state.next_repository_id,
            directory_id: request.directory_id,
            repository_id: request.repository_id,
            html_url: request.html_url.clone(),
            kind: request.kind,
            user_id: request.user_id,
            group_id: request.group_id,
            created_at: chrono::Utc::now(),
        };
        state.repositories.push(record.clone());
        Ok(record)
    }

    async fn update_group_status(&self, id: GroupId, status: GroupStatus) -> Result<()> {
        let mut state = self.state.write();
        let group = state.groups.get_mut(&id).ok_or(DbError::NotFound)?;
        group.status = status;
        Ok(())
    }

    async fn delete_group(&self, id: GroupId) -> Result<bool> {
        let mut state = self.state.write();
        if state.groups.remove(&id).is_none() {
            return Ok(false);
        }
        // ON DELETE SET NULL
        for repo in state.repositories.iter_mut().filter(|repo| repo.group_id == Some(id)) {
            repo.group_id = None;
        }
        Ok(true)
    }
}
