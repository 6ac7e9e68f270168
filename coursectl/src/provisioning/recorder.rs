//! Local writes made by a provisioning run. Neither write is retried or made idempotent.

use tracing::{info, instrument};

use crate::db::Store;
use crate::db::models::{
    courses::CourseDBResponse,
    repositories::{RepositoryCreateDBRequest, RepositoryDBResponse},
};
use crate::errors::Result;
use crate::scm::RemoteRepository;
use crate::types::{GroupId, GroupStatus, RepositoryKind};

/// Record `repository` as the group repository of `group_id`.
///
/// Recording the same provider repository twice fails with a unique violation.
#[instrument(skip(store, course, repository), fields(repository_id = repository.id), err)]
pub async fn record_repository(
    store: &dyn Store,
    course: &CourseDBResponse,
    group_id: GroupId,
    repository: &RemoteRepository,
) -> Result<RepositoryDBResponse> {
    let record = store
        .create_repository(&RepositoryCreateDBRequest {
            directory_id: course.directory_id,
            repository_id: repository.id,
            html_url: repository.web_url.clone(),
            kind: RepositoryKind::Group,
            user_id: None,
            group_id: Some(group_id),
        })
        .await?;
    info!("Recorded repository {} for group {}", record.html_url, group_id);
    Ok(record)
}

#[instrument(skip(store), err)]
pub async fn update_group_status(store: &dyn Store, group_id: GroupId, status: GroupStatus) -> Result<()> {
    store.update_group_status(group_id, status).await?;
    Ok(())
}
