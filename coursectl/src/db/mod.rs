//! Local persistence for users, courses, groups and recorded repositories.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ Provisioning / API   │
//! └──────────┬───────────┘
//!            │  Arc<dyn Store>
//!            ↓
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │    PostgresStore     │      │    InMemoryStore     │
//! └──────────┬───────────┘      └──────────────────────┘
//!            ↓
//! ┌──────────────────────┐
//! │ handlers (per table) │
//! └──────────┬───────────┘
//!            ↓
//!        PostgreSQL
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations over a PostgreSQL connection
//! - [`models`]: Record structures returned by the store
//! - [`errors`]: Database-specific error types
//! - [`in_memory`]: Store used by tests and local development
//!
//! Every store call is a single synchronous round trip; lookups return `Ok(None)` when the
//! entity is absent so callers can tell "missing" apart from a failing store.
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are applied on startup:
//!
//! ```ignore
//! coursectl::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::{
    errors::Result,
    handlers::{Courses, Groups, Repositories, Users},
    models::{
        courses::CourseDBResponse,
        groups::GroupDBResponse,
        repositories::{RepositoryCreateDBRequest, RepositoryDBResponse},
        users::UserDBResponse,
    },
};
use crate::types::{CourseId, GroupId, GroupStatus, UserId};

pub use in_memory::InMemoryStore;

/// The local store operations the rest of the application depends on.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get a user with their linked provider identities
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>>;

    /// Get a group with its members in enrollment order
    async fn get_group(&self, id: GroupId) -> Result<Option<GroupDBResponse>>;

    async fn get_course(&self, id: CourseId) -> Result<Option<CourseDBResponse>>;

    /// Record a provider repository.
    ///
    /// # Errors
    /// - `UniqueViolation` if `(directory_id, repository_id)` is already recorded
    async fn create_repository(&self, request: &RepositoryCreateDBRequest) -> Result<RepositoryDBResponse>;

    /// # Errors
    /// - `NotFound` if the group does not exist
    async fn update_group_status(&self, id: GroupId, status: GroupStatus) -> Result<()>;

    /// Delete a group, returning whether it existed
    async fn delete_group(&self, id: GroupId) -> Result<bool>;
}

/// [`Store`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_by_id(id).await
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<GroupDBResponse>> {
        // Group row, membership and member identities must come from one snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;
        let group = Groups::new(&mut tx).get_by_id(id).await?;
        tx.commit().await?;
        Ok(group)
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<CourseDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Courses::new(&mut conn).get_by_id(id).await
    }

    async fn create_repository(&self, request: &RepositoryCreateDBRequest) -> Result<RepositoryDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Repositories::new(&mut conn).create(request).await
    }

    async fn update_group_status(&self, id: GroupId, status: GroupStatus) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Groups::new(&mut conn).update_status(id, status).await
    }

    async fn delete_group(&self, id: GroupId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Groups::new(&mut conn).delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::db::models::repositories::REPOSITORY_UNIQUE_CONSTRAINT;
    use crate::test_utils::{insert_pg_course, insert_pg_group, insert_pg_user};
    use crate::types::RepositoryKind;

    #[sqlx::test]
    #[test_log::test]
    async fn test_postgres_store_round_trip(pool: PgPool) {
        let teacher = insert_pg_user(&pool, "teacher", true, &[("github", 70)]).await;
        let student = insert_pg_user(&pool, "u1", false, &[("github", 7)]).await;
        let course = insert_pg_course(&pool, "github", 100).await;
        let group_id = insert_pg_group(&pool, course, "g42", &[student]).await;
        let store = PostgresStore::new(pool.clone());

        let caller = store.get_user(teacher).await.unwrap().unwrap();
        assert!(caller.is_admin);
        assert_eq!(store.get_course(course).await.unwrap().unwrap().directory_id, 100);

        let group = store.get_group(group_id).await.unwrap().unwrap();
        assert_eq!(group.status, GroupStatus::Pending);
        assert_eq!(group.members[0].remote_identity_for("github").map(|i| i.remote_id), Some(7));

        let request = RepositoryCreateDBRequest {
            directory_id: 100,
            repository_id: 4242,
            html_url: "https://github.com/org/g42".to_string(),
            kind: RepositoryKind::Group,
            user_id: None,
            group_id: Some(group_id),
        };
        store.create_repository(&request).await.unwrap();
        let err = store.create_repository(&request).await.unwrap_err();
        assert!(err.is_unique_violation_of(REPOSITORY_UNIQUE_CONSTRAINT));

        store.update_group_status(group_id, GroupStatus::Approved).await.unwrap();
        assert_eq!(store.get_group(group_id).await.unwrap().unwrap().status, GroupStatus::Approved);

        assert!(store.delete_group(group_id).await.unwrap());
        assert!(!store.delete_group(group_id).await.unwrap());
        assert!(store.get_group(group_id).await.unwrap().is_none());
        assert!(matches!(
            store.update_group_status(group_id, GroupStatus::Approved).await,
            Err(DbError::NotFound)
        ));
    }
}
