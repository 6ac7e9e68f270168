use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    db::{Store, models::users::UserDBResponse},
    errors::{Error, Result},
    types::UserId,
};

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserDBResponse);

/// Resolve the caller from the identity header.
///
/// # Errors
/// - `Unauthenticated` if the header is missing or empty
/// - `PermissionDenied` if the header is repeated or is not a user id
/// - `NotFound` if no user has that id
#[instrument(skip(headers, store), err)]
pub async fn resolve_identity(headers: &HeaderMap, header_name: &str, store: &dyn Store) -> Result<UserDBResponse> {
    let mut values = headers.get_all(header_name).iter();
    let value = values.next().ok_or(Error::Unauthenticated { message: None })?;
    if values.next().is_some() {
        return Err(Error::PermissionDenied {
            message: "Multiple user tokens supplied".to_string(),
        });
    }

    let token = value
        .to_str()
        .map_err(|_| Error::PermissionDenied {
            message: "Malformed user token".to_string(),
        })?
        .trim();
    if token.is_empty() {
        return Err(Error::Unauthenticated {
            message: Some("Empty user token".to_string()),
        });
    }
    let id: UserId = token.parse().map_err(|_| Error::PermissionDenied {
        message: "Malformed user token".to_string(),
    })?;
    trace!("Identity header names user {}", id);

    let user = store.get_user(id).await?.ok_or_else(|| Error::not_found("User", id))?;
    debug!("Resolved caller {}", user.id);
    Ok(user)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = resolve_identity(&parts.headers, &state.config.auth.user_header, state.store.as_ref()).await?;
        state.sessions.open_for(&user, &state.config.providers);
        Ok(CurrentUser(user))
    }
}
