use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::models::groups::{GroupProvisionResponse, GroupResponse, GroupStatusUpdate},
    auth::{CurrentUser, permissions::require_admin},
    errors::{Error, Result},
    provisioning::{GroupProvisioner, ProvisionFailure},
    types::{GroupId, GroupStatus},
};

#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}",
    tag = "groups",
    summary = "Get group",
    responses(
        (status = 200, description = "Group details", body = GroupResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Group not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("group_id" = i64, Path, description = "Group ID")
    ),
    security(("X-Coursectl-User" = []))
)]
#[tracing::instrument(skip_all, fields(group_id = group_id))]
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    _: CurrentUser,
) -> Result<Json<GroupResponse>> {
    let group = state
        .store
        .get_group(group_id)
        .await?
        .ok_or_else(|| Error::not_found("Group", group_id))?;
    Ok(Json(group.into()))
}

/// Change a group's status, creating its repository and team on the course's provider.
#[utoipa::path(
    patch,
    path = "/api/v1/groups/{group_id}",
    tag = "groups",
    summary = "Update group status",
    request_body = GroupStatusUpdate,
    responses(
        (status = 200, description = "Group provisioned", body = GroupProvisionResponse),
        (status = 400, description = "Requested status out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a teacher, or has no session with the provider"),
        (status = 404, description = "Group, course or a member's provider link not found"),
        (status = 409, description = "Group is already being modified, or its repository is already recorded"),
        (status = 502, description = "Hosting provider request failed"),
        (status = 504, description = "Hosting provider did not answer in time")
    ),
    params(
        ("group_id" = i64, Path, description = "Group ID")
    ),
    security(("X-Coursectl-User" = []))
)]
#[tracing::instrument(skip_all, fields(group_id = group_id))]
pub async fn update_group_status(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    CurrentUser(caller): CurrentUser,
    Json(update): Json<GroupStatusUpdate>,
) -> std::result::Result<Json<GroupProvisionResponse>, ProvisionFailure> {
    let requested = GroupStatus::try_from(update.status)?;
    let _guard = state.group_locks.try_acquire(group_id)?;

    let provisioner = GroupProvisioner::new(
        state.store.clone(),
        state.sessions.clone(),
        state.config.provisioning.clone(),
    );
    let outcome = provisioner.provision_group(group_id, requested, &caller).await?;
    Ok(Json(GroupProvisionResponse::new(group_id, outcome)))
}

/// Delete a group that has not been approved
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}",
    tag = "groups",
    summary = "Delete group",
    responses(
        (status = 204, description = "Group deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a teacher, or the group is already approved"),
        (status = 404, description = "Group not found"),
        (status = 409, description = "Group is being modified")
    ),
    params(
        ("group_id" = i64, Path, description = "Group ID")
    ),
    security(("X-Coursectl-User" = []))
)]
#[tracing::instrument(skip_all, fields(group_id = group_id))]
pub async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    CurrentUser(caller): CurrentUser,
) -> Result<StatusCode> {
    require_admin(&caller, "delete groups")?;
    let _guard = state.group_locks.try_acquire(group_id)?;

    let group = state
        .store
        .get_group(group_id)
        .await?
        .ok_or_else(|| Error::not_found("Group", group_id))?;
    if !group.status.is_deletable() {
        return Err(Error::PermissionDenied {
            message: format!("Group {} has status {} and can no longer be deleted", group.id, group.status),
        });
    }

    if !state.store.delete_group(group_id).await? {
        return Err(Error::not_found("Group", group_id));
    }
    info!("Deleted group {} ({})", group.name, group.id);
    Ok(StatusCode::NO_CONTENT)
}
