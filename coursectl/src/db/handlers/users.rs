//! Database repository for users.

use crate::db::{
    errors::Result,
    models::users::{RemoteIdentity, UserDBResponse},
};
use crate::types::{RemoteId, UserId};
use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;
use tracing::instrument;

// Database entity models
#[derive(Debug, Clone, FromRow)]
struct User {
    id: UserId,
    name: String,
    is_admin: bool,
}

#[derive(Debug, Clone, FromRow)]
struct Identity {
    user_id: UserId,
    provider: String,
    remote_id: RemoteId,
    access_token: String,
}

impl From<Identity> for RemoteIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            provider: identity.provider,
            remote_id: identity.remote_id,
            access_token: identity.access_token,
        }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let mut users = self.get_bulk(&[id]).await?;
        Ok(users.remove(&id))
    }

    /// Fetch users together with their remote identities, keyed by user id
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn get_bulk(&mut self, ids: &[UserId]) -> Result<HashMap<UserId, UserDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = sqlx::query_as::<_, User>("SELECT id, name, is_admin FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        let identities = sqlx::query_as::<_, Identity>(
            r#"
            SELECT user_id, provider, remote_id, access_token
            FROM remote_identities
            WHERE user_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.db)
        .await?;

        let mut identities_by_user: HashMap<UserId, Vec<RemoteIdentity>> = HashMap::new();
        for identity in identities {
            identities_by_user.entry(identity.user_id).or_default().push(identity.into());
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let remote_identities = identities_by_user.remove(&user.id).unwrap_or_default();
                (
                    user.id,
                    UserDBResponse {
                        id: user.id,
                        name: user.name,
                        is_admin: user.is_admin,
                        remote_identities,
                    },
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_pg_user, token_for};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_bulk_joins_identities(pool: PgPool) {
        let teacher = insert_pg_user(&pool, "teacher", true, &[("github", 70), ("gitlab", 71)]).await;
        let student = insert_pg_user(&pool, "u1", false, &[("github", 7)]).await;
        let unlinked = insert_pg_user(&pool, "u2", false, &[]).await;
        let mut conn = pool.acquire().await.unwrap();

        let users = Users::new(&mut conn).get_bulk(&[teacher, student, unlinked, 999]).await.unwrap();

        assert_eq!(users.len(), 3);
        let teacher = &users[&teacher];
        assert!(teacher.is_admin);
        let providers: Vec<_> = teacher.remote_identities.iter().map(|i| i.provider.as_str()).collect();
        assert_eq!(providers, vec!["github", "gitlab"]);
        assert_eq!(
            users[&student].remote_identities,
            vec![RemoteIdentity {
                provider: "github".to_string(),
                remote_id: 7,
                access_token: token_for(student, "github"),
            }]
        );
        assert!(users[&unlinked].remote_identities.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_by_id(pool: PgPool) {
        let id = insert_pg_user(&pool, "u1", false, &[]).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);

        assert_eq!(users.get_by_id(id).await.unwrap().unwrap().name, "u1");
        assert!(users.get_by_id(id + 1).await.unwrap().is_none());
        assert!(users.get_bulk(&[]).await.unwrap().is_empty());
    }
}
