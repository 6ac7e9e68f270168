//! Hosting-provider (source code management) abstraction layer
//!
//! This module defines the [`Scm`] trait which abstracts the handful of provider operations
//! group provisioning needs: directory lookup, repository enumeration and creation, team
//! creation, attaching repositories to teams and resolving user handles.
//!
//! Every method is a network call that can fail independently; implementations make no
//! transactional guarantees across calls.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ScmProviderConfig;
use crate::types::RemoteId;

pub mod dummy;
pub mod github;
pub mod sessions;

pub use dummy::DummyScm;
pub use github::GitHubScm;
pub use sessions::ScmSessions;

/// Create a provider client from configuration for one user's access token
///
/// This is the single point where we convert config into client instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_client(config: &ScmProviderConfig, access_token: &str) -> Result<Arc<dyn Scm>> {
    match config {
        ScmProviderConfig::Github { base_url, request_timeout } => {
            Ok(Arc::new(GitHubScm::new(base_url.clone(), access_token, *request_timeout)?))
        }
        ScmProviderConfig::Dummy => Ok(Arc::new(DummyScm::new())),
    }
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ScmError>;

/// Errors that can occur while talking to a hosting provider
#[derive(Debug, thiserror::Error)]
pub enum ScmError {
    #[error("Provider API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Unknown hosting provider '{0}'")]
    UnknownProvider(String),

    #[error("{0}")]
    Other(String),
}

/// A namespace (organisation or group) holding course repositories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub id: RemoteId,
    pub path: String,
}

/// A repository as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub id: RemoteId,
    /// Repository name, unique within its directory
    pub path: String,
    /// Login of the owning organisation
    pub owner: String,
    pub web_url: String,
    pub directory_id: RemoteId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTeam {
    pub id: RemoteId,
    pub name: String,
    /// Provider usernames of the team members
    pub members: Vec<String>,
    /// Paths of repositories attached to the team
    pub repositories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRepositoryOptions {
    pub directory: Directory,
    pub path: String,
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTeamOptions {
    pub directory: Directory,
    pub team_name: String,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTeamRepoOptions {
    pub team_id: RemoteId,
    pub owner: String,
    pub repo: String,
}

/// Abstract hosting-provider interface
#[async_trait]
pub trait Scm: Send + Sync {
    /// Look up a directory by its provider id
    async fn get_directory(&self, id: RemoteId) -> Result<Directory>;

    /// List every repository in a directory.
    ///
    /// Providers only support enumeration, not lookups by path, so this returns the full
    /// listing.
    async fn list_repositories(&self, directory: &Directory) -> Result<Vec<RemoteRepository>>;

    async fn create_repository(&self, opts: &CreateRepositoryOptions) -> Result<RemoteRepository>;

    /// Create a team with the given members.
    ///
    /// Not idempotent: calling this twice may create two teams.
    async fn create_team(&self, opts: &CreateTeamOptions) -> Result<RemoteTeam>;

    /// Give a team access to a repository. Attaching an already attached repository is harmless.
    async fn add_repository_to_team(&self, opts: &AddTeamRepoOptions) -> Result<()>;

    /// Translate a provider user id into the provider's canonical username
    async fn get_username_by_id(&self, id: RemoteId) -> Result<String>;
}
