use crate::db::errors::DbError;
use crate::scm::ScmError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// No caller credential, or an empty one
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Caller lacks the required role, or presented a malformed credential
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Request is well-formed but asks for something outside the permitted range
    #[error("{message}")]
    InvalidArgument { message: String },

    /// A hosting-provider call failed
    #[error(transparent)]
    Remote(#[from] ScmError),

    /// A local store operation failed
    #[error(transparent)]
    Store(#[from] DbError),

    /// The caller-supplied deadline expired while waiting on a remote call
    #[error("Timed out waiting for {operation}")]
    Timeout { operation: String },

    /// Another operation currently holds the resource
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Error::Remote(_) => StatusCode::BAD_GATEWAY,
            Error::Store(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::PermissionDenied { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::InvalidArgument { message } => message.clone(),
            Error::Remote(scm_err) => match scm_err {
                ScmError::Api { status, .. } => format!("Hosting provider rejected the request ({status})"),
                _ => "Hosting provider request failed".to_string(),
            },
            Error::Store(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { table, constraint, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("repositories"), _) => "The repository is already recorded for this course".to_string(),
                    (Some("groups"), _) => "A group with this name already exists in the course".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Timeout { operation } => format!("Timed out waiting for {operation}"),
            Error::Conflict { message } => message.clone(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Store(DbError::Other(_)) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Store(_) | Error::Remote(_) | Error::Timeout { .. } => {
                tracing::warn!("Dependency error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::PermissionDenied { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::InvalidArgument { .. } | Error::NotFound { .. } | Error::Conflict { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = serde_json::json!({ "message": self.user_message() });
        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(Error::Unauthenticated { message: None }.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::PermissionDenied { message: "no".into() }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(Error::not_found("Group", 4).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::InvalidArgument { message: "bad".into() }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Timeout {
                operation: "list repositories".into()
            }
            .status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            Error::Remote(ScmError::Other("boom".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unique_violation_is_a_conflict() {
        let err = Error::Store(DbError::UniqueViolation {
            constraint: Some("repositories_directory_repository_unique".into()),
            table: Some("repositories".into()),
            message: "duplicate key".into(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "The repository is already recorded for this course");
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = Error::Other(anyhow::anyhow!("connection string postgres://secret@db"));
        assert_eq!(err.user_message(), "Internal server error");
    }
}
