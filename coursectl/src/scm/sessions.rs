//! Cache of authenticated provider clients, keyed by access token.
//!
//! Clients are opened from the configured providers the first time an authenticated user is seen
//! with a linked identity, and looked up again for every request acting on their behalf. A token
//! for a provider that is not configured never gets a client, so it has no live session.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::ScmProviderConfig;
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use crate::scm::{Scm, ScmError, create_client};

#[derive(Clone, Default)]
pub struct ScmSessions {
    clients: Arc<DashMap<String, Arc<dyn Scm>>>,
}

impl ScmSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache an already constructed client under `access_token`
    pub fn insert(&self, access_token: impl Into<String>, client: Arc<dyn Scm>) {
        self.clients.insert(access_token.into(), client);
    }

    /// Build a client for `provider` from configuration and cache it under `access_token`
    pub fn connect(
        &self,
        providers: &HashMap<String, ScmProviderConfig>,
        provider: &str,
        access_token: &str,
    ) -> Result<Arc<dyn Scm>, ScmError> {
        let config = providers
            .get(provider)
            .ok_or_else(|| ScmError::UnknownProvider(provider.to_string()))?;
        let client = create_client(config, access_token)?;
        self.insert(access_token, client.clone());
        debug!("Opened {} session", provider);
        Ok(client)
    }

    /// Open a session for each identity of `user` on a configured provider that has none yet.
    ///
    /// Failures are logged and leave the identity without a session.
    pub fn open_for(&self, user: &UserDBResponse, providers: &HashMap<String, ScmProviderConfig>) {
        for identity in &user.remote_identities {
            if self.clients.contains_key(&identity.access_token) || !providers.contains_key(&identity.provider) {
                continue;
            }
            if let Err(e) = self.connect(providers, &identity.provider, &identity.access_token) {
                warn!("Could not open {} session for user {}: {}", identity.provider, user.id, e);
            }
        }
    }

    /// Drop a cached client, returning whether one existed
    pub fn remove(&self, access_token: &str) -> bool {
        self.clients.remove(access_token).is_some()
    }

    /// Find the client acting for `user` against `provider`.
    ///
    /// # Errors
    /// - `PermissionDenied` if the user's token for the provider has no cached client
    /// - `NotFound` if the user has no identity linked for the provider
    pub fn resolve(&self, user: &UserDBResponse, provider: &str) -> Result<Arc<dyn Scm>, Error> {
        let identity = user.remote_identity_for(provider).ok_or_else(|| Error::NotFound {
            resource: "Provider link".to_string(),
            id: format!("{provider} for user {}", user.id),
        })?;
        self.clients
            .get(&identity.access_token)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::PermissionDenied {
                message: "Invalid token".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::users::RemoteIdentity;
    use crate::scm::DummyScm;

    fn teacher() -> UserDBResponse {
        UserDBResponse {
            id: 1,
            name: "teacher".to_string(),
            is_admin: true,
            remote_identities: vec![RemoteIdentity {
                provider: "github".to_string(),
                remote_id: 100,
                access_token: "gho_teacher".to_string(),
            }],
        }
    }

    #[test]
    fn test_resolve_uses_cached_client() {
        let sessions = ScmSessions::new();
        sessions.insert("gho_teacher", Arc::new(DummyScm::new()));
        assert!(sessions.resolve(&teacher(), "github").is_ok());
    }

    #[test]
    fn test_resolve_without_session_is_denied() {
        let sessions = ScmSessions::new();
        let err = sessions.resolve(&teacher(), "github").err().unwrap();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn test_resolve_without_link_is_not_found() {
        let sessions = ScmSessions::new();
        sessions.insert("gho_teacher", Arc::new(DummyScm::new()));
        let err = sessions.resolve(&teacher(), "gitlab").err().unwrap();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_connect_from_config() {
        let sessions = ScmSessions::new();
        let providers = HashMap::from([("github".to_string(), ScmProviderConfig::Dummy)]);

        assert!(matches!(
            sessions.connect(&providers, "gitlab", "gho_teacher").err().unwrap(),
            ScmError::UnknownProvider(_)
        ));
        sessions.connect(&providers, "github", "gho_teacher").unwrap();
        assert!(sessions.resolve(&teacher(), "github").is_ok());
        assert!(sessions.remove("gho_teacher"));
        assert!(sessions.resolve(&teacher(), "github").is_err());
    }

    #[test]
    fn test_open_for_only_configured_providers() {
        let sessions = ScmSessions::new();
        let mut user = teacher();
        user.remote_identities.push(RemoteIdentity {
            provider: "gitlab".to_string(),
            remote_id: 200,
            access_token: "glpat_teacher".to_string(),
        });
        let providers = HashMap::from([("github".to_string(), ScmProviderConfig::Dummy)]);

        sessions.open_for(&user, &providers);

        assert!(sessions.resolve(&user, "github").is_ok());
        let err = sessions.resolve(&user, "gitlab").err().unwrap();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_open_for_keeps_existing_client() {
        let sessions = ScmSessions::new();
        let existing = DummyScm::new();
        existing.add_username(7, "kept");
        sessions.insert("gho_teacher", Arc::new(existing));
        let providers = HashMap::from([("github".to_string(), ScmProviderConfig::Dummy)]);

        sessions.open_for(&teacher(), &providers);

        let client = sessions.resolve(&teacher(), "github").unwrap();
        assert_eq!(client.get_username_by_id(7).await.unwrap(), "kept");
    }
}
