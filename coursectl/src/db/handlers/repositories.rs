//! Database repository for recorded provider repositories.

use crate::db::{
    errors::{DbError, Result},
    models::repositories::{RepositoryCreateDBRequest, RepositoryDBResponse},
};
use crate::types::{GroupId, RemoteId, RepositoryRecordId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Repository {
    id: RepositoryRecordId,
    directory_id: RemoteId,
    repository_id: RemoteId,
    html_url: String,
    kind: String,
    user_id: Option<UserId>,
    group_id: Option<GroupId>,
    created_at: DateTime<Utc>,
}

impl TryFrom<Repository> for RepositoryDBResponse {
    type Error = DbError;

    fn try_from(row: Repository) -> Result<Self> {
        Ok(Self {
            id: row.id,
            directory_id: row.directory_id,
            repository_id: row.repository_id,
            html_url: row.html_url,
            kind: row.kind.parse()?,
            user_id: row.user_id,
            group_id: row.group_id,
            created_at: row.created_at,
        })
    }
}

pub struct Repositories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Repositories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a repository record. Fails with a unique violation if the provider repository is
    /// already recorded for the directory.
    #[instrument(skip(self, request), fields(directory_id = request.directory_id, repository_id = request.repository_id), err)]
    pub async fn create(&mut self, request: &RepositoryCreateDBRequest) -> Result<RepositoryDBResponse> {
        let row = sqlx::query_as::<_, Repository>(
            r#"
            INSERT INTO repositories (directory_id, repository_id, html_url, kind, user_id, group_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, directory_id, repository_id, html_url, kind, user_id, group_id, created_at
            "#,
        )
        .bind(request.directory_id)
        .bind(request.repository_id)
        .bind(&request.html_url)
        .bind(request.kind.as_str())
        .bind(request.user_id)
        .bind(request.group_id)
        .fetch_one(&mut *self.db)
        .await?;

        row.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::repositories::REPOSITORY_UNIQUE_CONSTRAINT;
    use crate::test_utils::{insert_pg_course, insert_pg_group};
    use crate::types::RepositoryKind;
    use sqlx::PgPool;

    fn request(directory_id: RemoteId, repository_id: RemoteId, group_id: GroupId) -> RepositoryCreateDBRequest {
        RepositoryCreateDBRequest {
            directory_id,
            repository_id,
            html_url: format!("https://github.com/org/{repository_id}"),
            kind: RepositoryKind::Group,
            user_id: None,
            group_id: Some(group_id),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_returns_record(pool: PgPool) {
        let course = insert_pg_course(&pool, "github", 100).await;
        let group_id = insert_pg_group(&pool, course, "g42", &[]).await;
        let mut conn = pool.acquire().await.unwrap();

        let record = Repositories::new(&mut conn).create(&request(100, 4242, group_id)).await.unwrap();

        assert_eq!(record.directory_id, 100);
        assert_eq!(record.repository_id, 4242);
        assert_eq!(record.kind, RepositoryKind::Group);
        assert_eq!(record.group_id, Some(group_id));
        assert_eq!(record.user_id, None);
        assert_eq!(record.html_url, "https://github.com/org/4242");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_twice_violates_directory_uniqueness(pool: PgPool) {
        let course = insert_pg_course(&pool, "github", 100).await;
        let group_id = insert_pg_group(&pool, course, "g42", &[]).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repositories = Repositories::new(&mut conn);

        repositories.create(&request(100, 4242, group_id)).await.unwrap();
        let err = repositories.create(&request(100, 4242, group_id)).await.unwrap_err();
        assert!(err.is_unique_violation_of(REPOSITORY_UNIQUE_CONSTRAINT), "got {err:?}");

        // Same provider id in another directory is a different repository
        repositories.create(&request(200, 4242, group_id)).await.unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_for_missing_group_violates_foreign_key(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let err = Repositories::new(&mut conn).create(&request(100, 1, 999)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
