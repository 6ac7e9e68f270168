//! GitHub implementation of [`Scm`].
//!
//! Course directories are GitHub organisations. Teams are created with the group members as
//! maintainers and repositories are attached through the team-by-id endpoint, which only needs
//! the numeric team id the provisioning workflow already holds.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use crate::scm::{
    AddTeamRepoOptions, CreateRepositoryOptions, CreateTeamOptions, Directory, RemoteRepository, RemoteTeam, Result, Scm,
    ScmError,
};
use crate::types::RemoteId;

const PAGE_SIZE: usize = 100;
const API_VERSION: &str = "2022-11-28";

pub struct GitHubScm {
    client: Client,
    base_url: Url,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Organization {
    id: RemoteId,
    login: String,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    id: RemoteId,
    name: String,
    html_url: String,
    owner: Owner,
}

#[derive(Debug, Deserialize)]
struct Team {
    id: RemoteId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

/// Makes sure a url has a trailing slash, so that `join` appends instead of replacing the last
/// path segment.
fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let mut path = new_url.path().to_string();
        path.push('/');
        new_url.set_path(&path);
        new_url
    }
}

impl GitHubScm {
    pub fn new(base_url: Url, access_token: &str, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("coursectl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            access_token: access_token.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = ensure_slash(&self.base_url)
            .join(path)
            .map_err(|e| ScmError::Other(format!("Failed to construct URL for {path}: {e}")))?;
        debug!("GitHub request: {} {}", method, url);
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    /// Send a request and map non-success statuses to [`ScmError::Api`]
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("GitHub API error {}: {}", status, body);
            return Err(ScmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| ScmError::Decode(e.to_string()))
    }
}

impl From<Repository> for RemoteRepository {
    fn from(repo: Repository) -> Self {
        Self {
            id: repo.id,
            path: repo.name,
            owner: repo.owner.login,
            web_url: repo.html_url,
            directory_id: 0,
        }
    }
}

#[async_trait]
impl Scm for GitHubScm {
    #[instrument(skip(self), err)]
    async fn get_directory(&self, id: RemoteId) -> Result<Directory> {
        let org: Organization = self.send_json(self.request(Method::GET, &format!("organizations/{id}"))?).await?;
        Ok(Directory {
            id: org.id,
            path: org.login,
        })
    }

    #[instrument(skip(self), fields(directory = %directory.path), err)]
    async fn list_repositories(&self, directory: &Directory) -> Result<Vec<RemoteRepository>> {
        let mut repositories = Vec::new();
        let mut page = 1;
        loop {
            let request = self
                .request(Method::GET, &format!("orgs/{}/repos", directory.path))?
                .query(&[("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())]);
            let batch: Vec<Repository> = self.send_json(request).await?;
            let done = batch.len() < PAGE_SIZE;
            repositories.extend(batch.into_iter().map(|repo| RemoteRepository {
                directory_id: directory.id,
                ..repo.into()
            }));
            if done {
                break;
            }
            page += 1;
        }
        debug!("Listed {} repositories in {}", repositories.len(), directory.path);
        Ok(repositories)
    }

    #[instrument(skip(self, opts), fields(directory = %opts.directory.path, path = %opts.path), err)]
    async fn create_repository(&self, opts: &CreateRepositoryOptions) -> Result<RemoteRepository> {
        let request = self
            .request(Method::POST, &format!("orgs/{}/repos", opts.directory.path))?
            .json(&json!({ "name": opts.path, "private": opts.private }));
        let repo: Repository = self.send_json(request).await?;
        Ok(RemoteRepository {
            directory_id: opts.directory.id,
            ..repo.into()
        })
    }

    #[instrument(skip(self, opts), fields(directory = %opts.directory.path, team = %opts.team_name), err)]
    async fn create_team(&self, opts: &CreateTeamOptions) -> Result<RemoteTeam> {
        let request = self
            .request(Method::POST, &format!("orgs/{}/teams", opts.directory.path))?
            .json(&json!({
                "name": opts.team_name,
                "maintainers": opts.users,
                "privacy": "closed",
            }));
        let team: Team = self.send_json(request).await?;
        Ok(RemoteTeam {
            id: team.id,
            name: team.name,
            members: opts.users.clone(),
            repositories: Vec::new(),
        })
    }

    #[instrument(skip(self, opts), fields(team_id = opts.team_id, repo = %opts.repo), err)]
    async fn add_repository_to_team(&self, opts: &AddTeamRepoOptions) -> Result<()> {
        let request = self
            .request(Method::PUT, &format!("teams/{}/repos/{}/{}", opts.team_id, opts.owner, opts.repo))?
            .json(&json!({ "permission": "push" }));
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get_username_by_id(&self, id: RemoteId) -> Result<String> {
        let user: User = self.send_json(self.request(Method::GET, &format!("user/{id}"))?).await?;
        Ok(user.login)
    }
}
