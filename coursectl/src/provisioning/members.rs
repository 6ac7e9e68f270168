//! Translates group members into provider usernames.

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, instrument};

use crate::db::models::users::UserDBResponse;
use crate::errors::{Error, Result};
use crate::provisioning::deadline::Deadline;
use crate::scm::Scm;
use crate::types::RemoteId;

/// Provider user ids of `members` for `provider`, in member order.
///
/// Fails with `NotFound` on the first member without a link, before any remote call is made.
pub fn linked_remote_ids(members: &[UserDBResponse], provider: &str) -> Result<Vec<RemoteId>> {
    members
        .iter()
        .map(|member| {
            member
                .remote_identity_for(provider)
                .map(|identity| identity.remote_id)
                .ok_or_else(|| Error::NotFound {
                    resource: "Provider link".to_string(),
                    id: format!("{provider} for user {}", member.id),
                })
        })
        .collect()
}

/// Look up the username of every id, with at most `concurrency` lookups in flight.
///
/// Results keep the order of `remote_ids`; the first failing lookup aborts the rest.
#[instrument(skip(scm, deadline, remote_ids), fields(members = remote_ids.len()), err)]
pub async fn resolve_usernames(
    scm: &dyn Scm,
    deadline: &Deadline,
    remote_ids: &[RemoteId],
    concurrency: usize,
) -> Result<Vec<String>> {
    let usernames: Vec<String> = stream::iter(remote_ids.iter().copied())
        .map(|remote_id| deadline.run("look up username", scm.get_username_by_id(remote_id)))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;
    debug!("Resolved usernames {:?}", usernames);
    Ok(usernames)
}
