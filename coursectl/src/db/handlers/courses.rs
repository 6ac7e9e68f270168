//! Database repository for courses.

use crate::db::{errors::Result, models::courses::CourseDBResponse};
use crate::types::CourseId;
use sqlx::PgConnection;
use tracing::instrument;

pub struct Courses<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Courses<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: CourseId) -> Result<Option<CourseDBResponse>> {
        let course = sqlx::query_as::<_, CourseDBResponse>("SELECT id, name, provider, directory_id FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(course)
    }
}
