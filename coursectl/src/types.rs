//! Common type definitions.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, GroupId, etc.)
//! - The ordered group approval status
//! - The repository kind tag used by local repository records
//!
//! # ID Types
//!
//! Local IDs are database-assigned integers. Provider-side IDs ([`RemoteId`]) are assigned by
//! the hosting provider and are only meaningful together with the provider they came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::errors::Error;

// Type aliases for IDs
pub type UserId = i64;
pub type GroupId = i64;
pub type CourseId = i64;
pub type RepositoryRecordId = i64;
/// Identifier assigned by a hosting provider (repository, team, directory or user id).
pub type RemoteId = i64;

/// Approval status of a student group.
///
/// The order matters: authorization compares statuses against a configured threshold, and only
/// groups that are still `Pending` or `Rejected` may be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum GroupStatus {
    Pending = 0,
    Rejected = 1,
    Approved = 2,
    Teacher = 3,
}

impl GroupStatus {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Whether the group may still be deleted by its members or a teacher
    pub fn is_deletable(self) -> bool {
        self <= GroupStatus::Rejected
    }
}

impl TryFrom<i64> for GroupStatus {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GroupStatus::Pending),
            1 => Ok(GroupStatus::Rejected),
            2 => Ok(GroupStatus::Approved),
            3 => Ok(GroupStatus::Teacher),
            other => Err(Error::InvalidArgument {
                message: format!("unknown group status {other}"),
            }),
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupStatus::Pending => write!(f, "pending"),
            GroupStatus::Rejected => write!(f, "rejected"),
            GroupStatus::Approved => write!(f, "approved"),
            GroupStatus::Teacher => write!(f, "teacher"),
        }
    }
}

/// Distinguishes individual student repositories from group repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    User,
    Group,
}

impl RepositoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RepositoryKind::User => "user",
            RepositoryKind::Group => "group",
        }
    }
}

impl std::str::FromStr for RepositoryKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(RepositoryKind::User),
            "group" => Ok(RepositoryKind::Group),
            other => Err(anyhow::anyhow!("unknown repository kind '{other}'")),
        }
    }
}
