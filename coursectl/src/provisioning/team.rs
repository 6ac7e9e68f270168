//! Team creation and repository attachment.
//!
//! Team creation is not idempotent at the provider, so neither step is retried.

use tracing::{info, instrument, warn};

use crate::errors::Result;
use crate::provisioning::deadline::Deadline;
use crate::scm::{AddTeamRepoOptions, CreateTeamOptions, Directory, RemoteRepository, RemoteTeam, Scm};

#[instrument(skip(scm, deadline, directory, usernames), fields(directory = %directory.path), err)]
pub async fn create_team(
    scm: &dyn Scm,
    deadline: &Deadline,
    directory: &Directory,
    team_name: &str,
    usernames: Vec<String>,
) -> Result<RemoteTeam> {
    let opts = CreateTeamOptions {
        directory: directory.clone(),
        team_name: team_name.to_string(),
        users: usernames,
    };
    let team = deadline
        .run("create team", scm.create_team(&opts))
        .await
        .inspect_err(|e| warn!("Failed to create team {} with {:?}: {}", team_name, opts.users, e))?;
    info!("Created team {} ({})", team.name, team.id);
    Ok(team)
}

/// Give `team` access to `repository` and return the team with the repository attached
#[instrument(skip_all, fields(team_id = team.id, repo = %repository.path), err)]
pub async fn attach_repository(
    scm: &dyn Scm,
    deadline: &Deadline,
    mut team: RemoteTeam,
    repository: &RemoteRepository,
) -> Result<RemoteTeam> {
    let opts = AddTeamRepoOptions {
        team_id: team.id,
        owner: repository.owner.clone(),
        repo: repository.path.clone(),
    };
    deadline
        .run("add repository to team", scm.add_repository_to_team(&opts))
        .await
        .inspect_err(|e| warn!("Failed to add {}/{} to team {}: {}", opts.owner, opts.repo, opts.team_id, e))?;
    if !team.repositories.contains(&repository.path) {
        team.repositories.push(repository.path.clone());
    }
    Ok(team)
}
