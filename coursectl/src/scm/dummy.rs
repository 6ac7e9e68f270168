//! Dummy hosting provider
//!
//! Keeps directories, repositories and teams in memory and records every call it receives.
//! Unknown directories and users are synthesised on first lookup, so a development server
//! configured with this provider works without seeding. Tests can seed state, inject failures
//! for a single operation and add latency to every call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::scm::{
    AddTeamRepoOptions, CreateRepositoryOptions, CreateTeamOptions, Directory, RemoteRepository, RemoteTeam, Result, Scm,
    ScmError,
};
use crate::types::RemoteId;

/// Provider operations, used to target failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScmOperation {
    GetDirectory,
    ListRepositories,
    CreateRepository,
    CreateTeam,
    AddRepositoryToTeam,
    GetUsername,
}

/// A call received by the dummy provider, with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScmCall {
    GetDirectory(RemoteId),
    ListRepositories(String),
    CreateRepository(CreateRepositoryOptions),
    CreateTeam(CreateTeamOptions),
    AddRepositoryToTeam(AddTeamRepoOptions),
    GetUsername(RemoteId),
}

impl ScmCall {
    pub fn operation(&self) -> ScmOperation {
        match self {
            ScmCall::GetDirectory(_) => ScmOperation::GetDirectory,
            ScmCall::ListRepositories(_) => ScmOperation::ListRepositories,
            ScmCall::CreateRepository(_) => ScmOperation::CreateRepository,
            ScmCall::CreateTeam(_) => ScmOperation::CreateTeam,
            ScmCall::AddRepositoryToTeam(_) => ScmOperation::AddRepositoryToTeam,
            ScmCall::GetUsername(_) => ScmOperation::GetUsername,
        }
    }
}

#[derive(Default)]
struct DummyState {
    directories: HashMap<RemoteId, Directory>,
    repositories: Vec<RemoteRepository>,
    teams: Vec<RemoteTeam>,
    usernames: HashMap<RemoteId, String>,
    failures: HashMap<ScmOperation, String>,
    latency: Option<Duration>,
    calls: Vec<ScmCall>,
    next_id: RemoteId,
}

impl DummyState {
    fn allocate_id(&mut self) -> RemoteId {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory provider that records every call. Clones share state.
#[derive(Clone, Default)]
pub struct DummyScm {
    state: Arc<Mutex<DummyState>>,
}

impl DummyScm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_directory(&self, directory: Directory) {
        self.state.lock().directories.insert(directory.id, directory);
    }

    /// Seed an existing repository; its owner is taken to be the directory path
    pub fn add_repository(&self, directory: &Directory, id: RemoteId, path: &str) -> RemoteRepository {
        let repository = RemoteRepository {
            id,
            path: path.to_string(),
            owner: directory.path.clone(),
            web_url: format!("https://scm.example/{}/{}", directory.path, path),
            directory_id: directory.id,
        };
        self.state.lock().repositories.push(repository.clone());
        repository
    }

    pub fn add_username(&self, id: RemoteId, username: &str) {
        self.state.lock().usernames.insert(id, username.to_string());
    }

    /// Make every future call of `operation` fail with an API error
    pub fn fail_on(&self, operation: ScmOperation, message: &str) {
        self.state.lock().failures.insert(operation, message.to_string());
    }

    /// Delay every call by `latency` before it is served
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = Some(latency);
    }

    pub fn calls(&self) -> Vec<ScmCall> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, operation: ScmOperation) -> usize {
        self.state.lock().calls.iter().filter(|call| call.operation() == operation).count()
    }

    pub fn repositories(&self) -> Vec<RemoteRepository> {
        self.state.lock().repositories.clone()
    }

    pub fn teams(&self) -> Vec<RemoteTeam> {
        self.state.lock().teams.clone()
    }

    /// Record the call, wait out the configured latency, then apply any injected failure
    async fn enter(&self, call: ScmCall) -> Result<()> {
        let operation = call.operation();
        let latency = {
            let mut state = self.state.lock();
            state.calls.push(call);
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.state.lock().failures.get(&operation) {
            Some(message) => Err(ScmError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Scm for DummyScm {
    async fn get_directory(&self, id: RemoteId) -> Result<Directory> {
        self.enter(ScmCall::GetDirectory(id)).await?;
        let mut state = self.state.lock();
        let directory = state.directories.entry(id).or_insert_with(|| Directory {
            id,
            path: format!("org-{id}"),
        });
        Ok(directory.clone())
    }

    async fn list_repositories(&self, directory: &Directory) -> Result<Vec<RemoteRepository>> {
        self.enter(ScmCall::ListRepositories(directory.path.clone())).await?;
        Ok(self
            .state
            .lock()
            .repositories
            .iter()
            .filter(|repo| repo.directory_id == directory.id)
            .cloned()
            .collect())
    }

    async fn create_repository(&self, opts: &CreateRepositoryOptions) -> Result<RemoteRepository> {
        self.enter(ScmCall::CreateRepository(opts.clone())).await?;
        let mut state = self.state.lock();
        if state
            .repositories
            .iter()
            .any(|repo| repo.directory_id == opts.directory.id && repo.path == opts.path)
        {
            return Err(ScmError::Api {
                status: 422,
                message: format!("name already exists on this account: {}", opts.path),
            });
        }
        let repository = RemoteRepository {
            id: state.allocate_id(),
            path: opts.path.clone(),
            owner: opts.directory.path.clone(),
            web_url: format!("https://scm.example/{}/{}", opts.directory.path, opts.path),
            directory_id: opts.directory.id,
        };
        state.repositories.push(repository.clone());
        tracing::info!("Dummy provider created repository {}/{}", repository.owner, repository.path);
        Ok(repository)
    }

    async fn create_team(&self, opts: &CreateTeamOptions) -> Result<RemoteTeam> {
        self.enter(ScmCall::CreateTeam(opts.clone())).await?;
        let mut state = self.state.lock();
        let team = RemoteTeam {
            id: state.allocate_id(),
            name: opts.team_name.clone(),
            members: opts.users.clone(),
            repositories: Vec::new(),
        };
        state.teams.push(team.clone());
        Ok(team)
    }

    async fn add_repository_to_team(&self, opts: &AddTeamRepoOptions) -> Result<()> {
        self.enter(ScmCall::AddRepositoryToTeam(opts.clone())).await?;
        let mut state = self.state.lock();
        let team = state
            .teams
            .iter_mut()
            .find(|team| team.id == opts.team_id)
            .ok_or_else(|| ScmError::Api {
                status: 404,
                message: format!("team {} not found", opts.team_id),
            })?;
        if !team.repositories.contains(&opts.repo) {
            team.repositories.push(opts.repo.clone());
        }
        Ok(())
    }

    async fn get_username_by_id(&self, id: RemoteId) -> Result<String> {
        self.enter(ScmCall::GetUsername(id)).await?;
        let mut state = self.state.lock();
        Ok(state.usernames.entry(id).or_insert_with(|| format!("user-{id}")).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Directory {
        Directory {
            id: 1,
            path: "org/course".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_repository_rejects_duplicate_path() {
        let scm = DummyScm::new();
        let opts = CreateRepositoryOptions {
            directory: directory(),
            path: "g1".to_string(),
            private: true,
        };
        let repo = scm.create_repository(&opts).await.unwrap();
        assert_eq!(repo.owner, "org/course");

        let err = scm.create_repository(&opts).await.unwrap_err();
        assert!(matches!(err, ScmError::Api { status: 422, .. }));
        assert_eq!(scm.repositories().len(), 1);
        assert_eq!(scm.count(ScmOperation::CreateRepository), 2);
    }

    #[tokio::test]
    async fn test_listing_is_scoped_to_directory() {
        let scm = DummyScm::new();
        let other = Directory {
            id: 2,
            path: "other".to_string(),
        };
        scm.add_repository(&directory(), 10, "g1");
        scm.add_repository(&other, 11, "g1");

        let repos = scm.list_repositories(&directory()).await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].id, 10);
    }

    #[tokio::test]
    async fn test_injected_failure_is_still_recorded() {
        let scm = DummyScm::new();
        scm.fail_on(ScmOperation::CreateTeam, "boom");

        let err = scm
            .create_team(&CreateTeamOptions {
                directory: directory(),
                team_name: "g1".to_string(),
                users: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScmError::Api { status: 500, .. }));
        assert_eq!(scm.count(ScmOperation::CreateTeam), 1);
        assert!(scm.teams().is_empty());
    }

    #[tokio::test]
    async fn test_attaching_twice_is_harmless() {
        let scm = DummyScm::new();
        let team = scm
            .create_team(&CreateTeamOptions {
                directory: directory(),
                team_name: "g1".to_string(),
                users: vec!["alice".to_string()],
            })
            .await
            .unwrap();
        let opts = AddTeamRepoOptions {
            team_id: team.id,
            owner: "org/course".to_string(),
            repo: "g1".to_string(),
        };
        scm.add_repository_to_team(&opts).await.unwrap();
        scm.add_repository_to_team(&opts).await.unwrap();
        assert_eq!(scm.teams()[0].repositories, vec!["g1"]);
    }

    #[tokio::test]
    async fn test_unknown_lookups_are_synthesised() {
        let scm = DummyScm::new();
        scm.add_username(7, "u1-handle");
        assert_eq!(scm.get_username_by_id(7).await.unwrap(), "u1-handle");
        assert_eq!(scm.get_username_by_id(8).await.unwrap(), "user-8");
        assert_eq!(scm.get_directory(5).await.unwrap().path, "org-5");
    }
}
