//! Authorization predicates.
//!
//! Role checks live here rather than in handlers so every entry point applies the same rules.

use crate::db::models::users::UserDBResponse;
use crate::errors::{Error, Result};
use crate::types::GroupStatus;

/// Require the caller to hold the privileged (teacher/admin) role
pub fn require_admin(caller: &UserDBResponse, action: &str) -> Result<()> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(Error::PermissionDenied {
            message: format!("Only teachers may {action}"),
        })
    }
}

/// Decide whether `caller` may move a group to `requested`.
///
/// The role check comes first, so unprivileged callers learn nothing about the permitted range.
pub fn authorize_status_change(caller: &UserDBResponse, requested: GroupStatus, threshold: GroupStatus) -> Result<()> {
    require_admin(caller, "change group status")?;
    if requested > threshold {
        return Err(Error::InvalidArgument {
            message: format!("Requested status {requested} exceeds the permitted maximum {threshold}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> UserDBResponse {
        UserDBResponse {
            id: 1,
            name: "caller".to_string(),
            is_admin,
            remote_identities: vec![],
        }
    }

    #[test]
    fn test_students_cannot_change_status() {
        let err = authorize_status_change(&user(false), GroupStatus::Approved, GroupStatus::Teacher).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn test_students_are_denied_even_above_threshold() {
        let err = authorize_status_change(&user(false), GroupStatus::Teacher, GroupStatus::Approved).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let teacher = user(true);
        assert!(authorize_status_change(&teacher, GroupStatus::Approved, GroupStatus::Approved).is_ok());
        assert!(authorize_status_change(&teacher, GroupStatus::Rejected, GroupStatus::Approved).is_ok());

        let err = authorize_status_change(&teacher, GroupStatus::Teacher, GroupStatus::Approved).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
