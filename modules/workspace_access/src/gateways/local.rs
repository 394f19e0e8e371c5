use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    client::WorkspaceAccessApi,
    error::WorkspaceAccessError,
    model::{AuthzDecision, Capability, MemberProfile, NewNotification, Notification, User, Workspace},
};
use crate::domain::{error::DomainError, service::Service};

/// Local implementation of the WorkspaceAccessApi trait that delegates to the domain service
pub struct WorkspaceAccessLocalClient {
    service: Arc<Service>,
}

impl WorkspaceAccessLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl WorkspaceAccessApi for WorkspaceAccessLocalClient {
    async fn check_authorization(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        capability: Capability,
    ) -> Result<AuthzDecision, WorkspaceAccessError> {
        self.service
            .check_authorization(workspace_id, user_id, capability)
            .await
            .map_err(map_domain_error)
    }

    async fn notify(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, WorkspaceAccessError> {
        self.service
            .notify(notification)
            .await
            .map_err(map_domain_error)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, WorkspaceAccessError> {
        self.service.get_user(id).await.map_err(map_domain_error)
    }

    async fn get_workspace(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Workspace, WorkspaceAccessError> {
        self.service
            .get_workspace(user_id, workspace_id)
            .await
            .map_err(map_domain_error)
    }

    async fn list_members(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<MemberProfile>, WorkspaceAccessError> {
        self.service
            .list_members(user_id, workspace_id)
            .await
            .map_err(map_domain_error)
    }
}

/// Map domain errors to contract errors
pub fn map_domain_error(e: DomainError) -> WorkspaceAccessError {
    match e {
        DomainError::NotFound { resource, id } => WorkspaceAccessError::not_found(resource, id),
        DomainError::Forbidden { reason } => WorkspaceAccessError::forbidden(reason),
        DomainError::AuthenticationRequired => WorkspaceAccessError::AuthenticationRequired,
        DomainError::PendingApproval { .. } => WorkspaceAccessError::PendingApproval,
        DomainError::InvalidCredentials => WorkspaceAccessError::InvalidCredentials,
        e @ DomainError::InvalidStateTransition { .. } => {
            WorkspaceAccessError::InvalidStateTransition {
                message: e.to_string(),
            }
        }
        DomainError::AlreadyConsumed { workspace_id } => {
            WorkspaceAccessError::AlreadyConsumed { workspace_id }
        }
        DomainError::Expired { .. } => WorkspaceAccessError::Expired,
        DomainError::InvalidInviteCode { .. } => WorkspaceAccessError::InvalidInviteCode,
        DomainError::WorkspaceIsPrivate { workspace_id } => {
            WorkspaceAccessError::WorkspaceIsPrivate { workspace_id }
        }
        DomainError::CannotRemoveOwner { .. } => WorkspaceAccessError::CannotRemoveOwner,
        DomainError::LastPlatformOwner => WorkspaceAccessError::LastPlatformOwner,
        DomainError::EmailAlreadyExists { email } => WorkspaceAccessError::Conflict {
            message: format!("email '{email}' is already registered"),
        },
        DomainError::Validation { field, message } => {
            WorkspaceAccessError::validation(format!("{field}: {message}"))
        }
        DomainError::Database { message } | DomainError::Internal { message } => {
            tracing::error!(%message, "Internal error behind local client");
            WorkspaceAccessError::internal()
        }
    }
}
