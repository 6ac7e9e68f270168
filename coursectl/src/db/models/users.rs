//! Database models for users.

use crate::types::{RemoteId, UserId};
use serde::{Deserialize, Serialize};

/// A user's link to one hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
    /// Provider name, e.g. "github"
    pub provider: String,
    /// The user's numeric id at the provider
    pub remote_id: RemoteId,
    /// Access token issued by the provider when the user linked their account
    pub access_token: String,
}

/// Database response for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub is_admin: bool,
    /// At most one entry per provider
    pub remote_identities: Vec<RemoteIdentity>,
}

impl UserDBResponse {
    /// The identity this user linked for `provider`, if any
    pub fn remote_identity_for(&self, provider: &str) -> Option<&RemoteIdentity> {
        self.remote_identities.iter().find(|identity| identity.provider == provider)
    }
}
