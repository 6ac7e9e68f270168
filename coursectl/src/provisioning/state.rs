use std::fmt;

use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::Error;

/// Stages of one provisioning run.
///
/// Runs move strictly forward through the stages in declaration order. `Failed` is absorbing and
/// reachable from every stage before `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionState {
    Requested,
    Authorized,
    RepoResolved,
    RepoPersisted,
    StatusUpdated,
    MembersResolved,
    TeamSynced,
    Completed,
    Failed,
}

impl ProvisionState {
    /// The stage after this one, or `None` for terminal states
    pub fn next(self) -> Option<Self> {
        use ProvisionState::*;
        match self {
            Requested => Some(Authorized),
            Authorized => Some(RepoResolved),
            RepoResolved => Some(RepoPersisted),
            RepoPersisted => Some(StatusUpdated),
            StatusUpdated => Some(MembersResolved),
            MembersResolved => Some(TeamSynced),
            TeamSynced => Some(Completed),
            Completed | Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProvisionState::Requested => "requested",
            ProvisionState::Authorized => "authorized",
            ProvisionState::RepoResolved => "repo_resolved",
            ProvisionState::RepoPersisted => "repo_persisted",
            ProvisionState::StatusUpdated => "status_updated",
            ProvisionState::MembersResolved => "members_resolved",
            ProvisionState::TeamSynced => "team_synced",
            ProvisionState::Completed => "completed",
            ProvisionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first error of a failed run, with the stage that was being entered when it occurred.
///
/// Stages before `stage` completed and their side effects (remote repositories, local records,
/// teams) remain in place.
#[derive(Debug, thiserror::Error)]
#[error("provisioning failed entering {stage}: {error}")]
pub struct ProvisionFailure {
    pub stage: ProvisionState,
    #[source]
    pub error: Error,
}

impl ProvisionFailure {
    pub fn into_error(self) -> Error {
        self.error
    }
}

/// Errors raised before a run starts, such as request validation
impl From<Error> for ProvisionFailure {
    fn from(error: Error) -> Self {
        ProvisionFailure {
            stage: ProvisionState::Requested,
            error,
        }
    }
}

impl IntoResponse for ProvisionFailure {
    fn into_response(self) -> Response {
        let stage = self.stage;
        let mut response = self.error.into_response();
        if let Ok(value) = stage.as_str().parse() {
            response.headers_mut().insert("x-provision-stage", value);
        }
        response
    }
}
