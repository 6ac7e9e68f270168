//! Find-or-create for the group repository.
//!
//! The provider is the source of truth for existence: every run lists the directory afresh
//! instead of trusting local records, which makes repeating a run safe up to this point.

use std::collections::HashMap;

use tracing::{info, instrument, warn};

use crate::errors::Result;
use crate::provisioning::deadline::Deadline;
use crate::scm::{CreateRepositoryOptions, Directory, RemoteRepository, Scm};

#[derive(Debug, Clone)]
pub struct ReconciledRepository {
    pub repository: RemoteRepository,
    /// Whether this run created the repository
    pub created: bool,
}

/// Return the repository at `path` in `directory`, creating a private one if none exists.
///
/// A failed create is surfaced as is; there is no fallback to the listing.
#[instrument(skip(scm, deadline, directory), fields(directory = %directory.path), err)]
pub async fn reconcile_repository(
    scm: &dyn Scm,
    deadline: &Deadline,
    directory: &Directory,
    path: &str,
) -> Result<ReconciledRepository> {
    let repositories = deadline.run("list repositories", scm.list_repositories(directory)).await?;
    let existing: HashMap<&str, &RemoteRepository> = repositories.iter().map(|repo| (repo.path.as_str(), repo)).collect();

    if let Some(repository) = existing.get(path) {
        info!("Reusing existing repository {}/{}", repository.owner, repository.path);
        return Ok(ReconciledRepository {
            repository: (*repository).clone(),
            created: false,
        });
    }

    let opts = CreateRepositoryOptions {
        directory: directory.clone(),
        path: path.to_string(),
        private: true,
    };
    let repository = deadline
        .run("create repository", scm.create_repository(&opts))
        .await
        .inspect_err(|e| warn!("Failed to create repository {}/{}: {}", directory.path, path, e))?;
    info!("Created repository {}/{}", repository.owner, repository.path);
    Ok(ReconciledRepository {
        repository,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::scm::DummyScm;
    use crate::scm::dummy::ScmOperation;
    use std::time::Duration;

    fn directory() -> Directory {
        Directory {
            id: 1,
            path: "org/course".to_string(),
        }
    }

    #[tokio::test]
    async fn test_creates_missing_repository() {
        let scm = DummyScm::new();
        scm.add_repository(&directory(), 50, "g41");
        let deadline = Deadline::after(Duration::from_secs(5));

        let reconciled = reconcile_repository(&scm, &deadline, &directory(), "g42").await.unwrap();
        assert!(reconciled.created);
        assert_eq!(reconciled.repository.path, "g42");
        assert_eq!(scm.count(ScmOperation::CreateRepository), 1);
    }

    #[tokio::test]
    async fn test_reuses_existing_repository() {
        let scm = DummyScm::new();
        let existing = scm.add_repository(&directory(), 50, "g42");
        let deadline = Deadline::after(Duration::from_secs(5));

        let reconciled = reconcile_repository(&scm, &deadline, &directory(), "g42").await.unwrap();
        assert!(!reconciled.created);
        assert_eq!(reconciled.repository, existing);
        assert_eq!(scm.count(ScmOperation::CreateRepository), 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_surfaced() {
        let scm = DummyScm::new();
        scm.fail_on(ScmOperation::CreateRepository, "quota exceeded");
        let deadline = Deadline::after(Duration::from_secs(5));

        let err = reconcile_repository(&scm, &deadline, &directory(), "g42").await.unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
    }
}
