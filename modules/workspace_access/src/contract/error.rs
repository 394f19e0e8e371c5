use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceAccessError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Account is pending approval")]
    PendingApproval,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid state transition: {message}")]
    InvalidStateTransition { message: String },

    #[error("Invitation already consumed")]
    AlreadyConsumed { workspace_id: Option<Uuid> },

    #[error("Invitation expired")]
    Expired,

    #[error("Invalid invite code")]
    InvalidInviteCode,

    #[error("Workspace {workspace_id} is private")]
    WorkspaceIsPrivate { workspace_id: Uuid },

    #[error("The workspace owner cannot be removed")]
    CannotRemoveOwner,

    #[error("The last platform owner cannot be demoted or deleted")]
    LastPlatformOwner,

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error")]
    Internal,
}

impl WorkspaceAccessError {
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}
