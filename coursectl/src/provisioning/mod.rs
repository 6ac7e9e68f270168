//! Group provisioning workflow.
//!
//! Takes an approved student group and makes the hosting provider and the local store reflect
//! it: a private repository named after the group, a local record of that repository, the new
//! group status, and a team of the group members with access to the repository.
//!
//! # Stages
//!
//! ```text
//! Requested → Authorized → RepoResolved → RepoPersisted → StatusUpdated
//!           → MembersResolved → TeamSynced → Completed
//! ```
//!
//! Each stage depends on the one before it and the first error ends the run (see
//! [`ProvisionFailure`]). Nothing is rolled back: remote resources created before a failure stay
//! in place. Repeating a run is safe up to `RepoResolved`, because the repository is looked up
//! before it is created. Past that point a repeat fails on the local repository record, and a
//! run that got as far as team creation may leave a duplicate team behind.
//!
//! Runs for the same group must be serialised by the caller; the HTTP layer does this with a
//! per-group guard.

pub mod deadline;
pub mod members;
pub mod recorder;
pub mod repository;
pub mod state;
pub mod team;


use std::sync::Arc;

use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::auth::permissions::authorize_status_change;
use crate::config::ProvisioningConfig;
use crate::db::{
    Store,
    models::{repositories::RepositoryDBResponse, users::UserDBResponse},
};
use crate::errors::{Error, Result};
use crate::scm::{RemoteRepository, RemoteTeam, ScmSessions};
use crate::types::{GroupId, GroupStatus};

pub use deadline::Deadline;
pub use state::{ProvisionFailure, ProvisionState};

/// What a successful run created or reused
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionOutcome {
    pub repository: RemoteRepository,
    /// Whether the repository was created by this run rather than found
    pub repository_created: bool,
    pub record: RepositoryDBResponse,
    pub team: RemoteTeam,
    pub status: GroupStatus,
}

/// Runs the provisioning workflow against a store and the callers' provider sessions
#[derive(Clone)]
pub struct GroupProvisioner {
    store: Arc<dyn Store>,
    sessions: ScmSessions,
    config: ProvisioningConfig,
}

/// Tracks the stage a run is in
struct Progress {
    group_id: GroupId,
    stage: ProvisionState,
}

impl Progress {
    fn enter(&mut self, stage: ProvisionState) {
        debug!(group_id = self.group_id, from = %self.stage, to = %stage, "Provisioning stage");
        self.stage = stage;
    }
}

impl GroupProvisioner {
    pub fn new(store: Arc<dyn Store>, sessions: ScmSessions, config: ProvisioningConfig) -> Self {
        Self { store, sessions, config }
    }

    /// Provision `group_id` on behalf of `caller` and move it to `requested`.
    ///
    /// The caller must be privileged, `requested` must not exceed the configured threshold and
    /// the group's current status must be below it. All of this is checked before any provider
    /// call is made.
    pub async fn provision_group(
        &self,
        group_id: GroupId,
        requested: GroupStatus,
        caller: &UserDBResponse,
    ) -> std::result::Result<ProvisionOutcome, ProvisionFailure> {
        let span = info_span!("provision_group", group_id, requested = %requested, caller = caller.id);
        let mut progress = Progress {
            group_id,
            stage: ProvisionState::Requested,
        };

        match self.run(&mut progress, group_id, requested, caller).instrument(span).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                warn!(group_id, stage = %progress.stage, "Group provisioning failed: {}", error);
                Err(ProvisionFailure {
                    stage: progress.stage,
                    error,
                })
            }
        }
    }

    async fn run(
        &self,
        progress: &mut Progress,
        group_id: GroupId,
        requested: GroupStatus,
        caller: &UserDBResponse,
    ) -> Result<ProvisionOutcome> {
        let store = self.store.as_ref();
        let threshold = self.config.status_threshold;

        progress.enter(ProvisionState::Authorized);
        authorize_status_change(caller, requested, threshold)?;
        let group = store
            .get_group(group_id)
            .await?
            .ok_or_else(|| Error::not_found("Group", group_id))?;
        if group.status >= threshold {
            return Err(Error::PermissionDenied {
                message: format!("Group {} has status {}, which is reserved", group.id, group.status),
            });
        }
        let course = store
            .get_course(group.course_id)
            .await?
            .ok_or_else(|| Error::not_found("Course", group.course_id))?;
        let scm = self.sessions.resolve(caller, &course.provider)?;
        let scm = scm.as_ref();
        let deadline = Deadline::after(self.config.request_timeout);

        progress.enter(ProvisionState::RepoResolved);
        let directory = deadline.run("get directory", scm.get_directory(course.directory_id)).await?;
        debug!("Course {} lives in directory {}", course.id, directory.path);
        let reconciled = repository::reconcile_repository(scm, &deadline, &directory, &group.name).await?;

        progress.enter(ProvisionState::RepoPersisted);
        let record = recorder::record_repository(store, &course, group.id, &reconciled.repository).await?;

        progress.enter(ProvisionState::StatusUpdated);
        recorder::update_group_status(store, group.id, requested).await?;

        progress.enter(ProvisionState::MembersResolved);
        let remote_ids = members::linked_remote_ids(&group.members, &course.provider)?;
        let usernames =
            members::resolve_usernames(scm, &deadline, &remote_ids, self.config.member_lookup_concurrency).await?;

        progress.enter(ProvisionState::TeamSynced);
        let team = team::create_team(scm, &deadline, &directory, &group.name, usernames).await?;
        let team = team::attach_repository(scm, &deadline, team, &reconciled.repository).await?;

        progress.enter(ProvisionState::Completed);
        info!(
            "Provisioned group {} ({}) with repository {} and team {}",
            group.name, group.id, reconciled.repository.web_url, team.id
        );
        Ok(ProvisionOutcome {
            repository: reconciled.repository,
            repository_created: reconciled.created,
            record,
            team,
            status: requested,
        })
    }
}
