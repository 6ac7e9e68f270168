//! Database repository for groups.

use crate::db::{
    errors::{DbError, Result},
    handlers::Users,
    models::groups::GroupDBResponse,
};
use crate::types::{CourseId, GroupId, GroupStatus, UserId};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Group {
    id: GroupId,
    name: String,
    course_id: CourseId,
    status: i16,
}

pub struct Groups<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Groups<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fetch a group with its members resolved in enrollment order
    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: GroupId) -> Result<Option<GroupDBResponse>> {
        let Some(group) = sqlx::query_as::<_, Group>("SELECT id, name, course_id, status FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
        else {
            return Ok(None);
        };

        let member_ids: Vec<UserId> = sqlx::query_scalar("SELECT user_id FROM group_users WHERE group_id = $1 ORDER BY id")
            .bind(id)
            .fetch_all(&mut *self.db)
            .await?;

        let mut users = Users::new(&mut *self.db).get_bulk(&member_ids).await?;
        let members = member_ids.iter().filter_map(|user_id| users.remove(user_id)).collect();

        let status = GroupStatus::try_from(i64::from(group.status)).map_err(|e| DbError::Other(anyhow::anyhow!("group {id}: {e}")))?;

        Ok(Some(GroupDBResponse {
            id: group.id,
            name: group.name,
            course_id: group.course_id,
            status,
            members,
        }))
    }

    #[instrument(skip(self), err)]
    pub async fn update_status(&mut self, id: GroupId, status: GroupStatus) -> Result<()> {
        let result = sqlx::query("UPDATE groups SET status = $1 WHERE id = $2")
            .bind(status.as_i16())
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: GroupId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }
}
