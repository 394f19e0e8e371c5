use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::error::WorkspaceAccessError;
use crate::contract::model::{
    AuthzDecision, Capability, MemberProfile, NewNotification, Notification, User, Workspace,
};

/// In-process API other modules (task and project handlers) use to consult
/// workspace permissions and to emit notifications.
#[async_trait]
pub trait WorkspaceAccessApi: Send + Sync {
    /// Pure permission check for `user_id` inside `workspace_id`.
    async fn check_authorization(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        capability: Capability,
    ) -> Result<AuthzDecision, WorkspaceAccessError>;

    /// Record a notification for its recipient. Every call creates one record.
    async fn notify(&self, notification: NewNotification)
        -> Result<Notification, WorkspaceAccessError>;

    async fn get_user(&self, id: Uuid) -> Result<User, WorkspaceAccessError>;

    /// Workspace lookup on behalf of `user_id`; requires membership.
    async fn get_workspace(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Workspace, WorkspaceAccessError>;

    /// Members of the workspace on behalf of `user_id`; requires membership.
    async fn list_members(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<MemberProfile>, WorkspaceAccessError>;
}
