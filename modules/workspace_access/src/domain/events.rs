use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::WorkspaceRole;

/// Transport-agnostic domain event.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDomainEvent {
    UserRegistered { id: Uuid, at: DateTime<Utc> },
    UserApproved { id: Uuid, at: DateTime<Utc> },
    UserDeleted { id: Uuid, at: DateTime<Utc> },
    AccessRequestReviewed { id: Uuid, approved: bool, at: DateTime<Utc> },
    WorkspaceCreated { id: Uuid, owner_id: Uuid, at: DateTime<Utc> },
    WorkspaceDeleted { id: Uuid, at: DateTime<Utc> },
    MemberJoined { workspace_id: Uuid, user_id: Uuid, role: WorkspaceRole, at: DateTime<Utc> },
    MemberRemoved { workspace_id: Uuid, user_id: Uuid, at: DateTime<Utc> },
    OwnershipTransferred { workspace_id: Uuid, from: Uuid, to: Uuid, at: DateTime<Utc> },
    InvitationIssued { id: Uuid, workspace_id: Uuid, at: DateTime<Utc> },
    InvitationAccepted { id: Uuid, workspace_id: Uuid, user_id: Uuid, at: DateTime<Utc> },
}
