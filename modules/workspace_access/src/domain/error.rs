use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::repo::UserConflict;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Account '{email}' is pending approval")]
    PendingApproval { email: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Cannot {action} {entity} in state '{state}'")]
    InvalidStateTransition {
        entity: &'static str,
        state: String,
        action: &'static str,
    },

    #[error("Invitation has already been accepted")]
    AlreadyConsumed { workspace_id: Option<Uuid> },

    #[error("Invitation expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    #[error("No workspace matches invite code '{code}'")]
    InvalidInviteCode { code: String },

    #[error("Workspace {workspace_id} is private and does not accept members")]
    WorkspaceIsPrivate { workspace_id: Uuid },

    #[error("Owner of workspace {workspace_id} cannot be removed")]
    CannotRemoveOwner { workspace_id: Uuid },

    #[error("The last platform owner cannot be demoted or deleted")]
    LastPlatformOwner,

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        Self::not_found("User", id)
    }

    pub fn workspace_not_found(id: Uuid) -> Self {
        Self::not_found("Workspace", id)
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        state: impl ToString,
        action: &'static str,
    ) -> Self {
        Self::InvalidStateTransition {
            entity,
            state: state.to_string(),
            action,
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Repository failures are infrastructure faults; keep the full context chain.
/// A duplicate email reported by the store is a conflict, not a fault.
impl From<anyhow::Error> for DomainError {
    fn from(e: anyhow::Error) -> Self {
        if let Some(UserConflict::Email(email)) = e.downcast_ref::<UserConflict>() {
            return Self::EmailAlreadyExists {
                email: email.clone(),
            };
        }
        Self::database(format!("{e:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn duplicate_email_from_store_is_a_conflict() {
        let err: anyhow::Result<()> = Err(UserConflict::Email("ana@example.com".into()).into());
        let mapped = DomainError::from(err.context("insert user failed").unwrap_err());
        assert!(matches!(
            mapped,
            DomainError::EmailAlreadyExists { ref email } if email == "ana@example.com"
        ));

        let mapped = DomainError::from(anyhow::anyhow!("connection reset"));
        assert!(matches!(mapped, DomainError::Database { .. }));
    }
}
