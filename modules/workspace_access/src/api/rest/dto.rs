use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::contract::model::{
    AcceptOutcome, AccessRequest, Credential, Invitation, InviteAcceptance, InvitePreview,
    IssuedInvitation, MemberProfile, Membership, NewAccessRequest, NewUser, NewWorkspace,
    Notification, ParseEnumError, User, Workspace, WorkspacePatch,
};
use crate::domain::error::DomainError;

/// Parse one of the closed enumerations from a request field.
pub fn parse_field<T>(field: &str, value: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = ParseEnumError>,
{
    value
        .trim()
        .parse()
        .map_err(|e: ParseEnumError| DomainError::validation(field, e.to_string()))
}

// --- accounts ---

/// REST DTO for an account. Credentials never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    #[schema(example = "member")]
    pub platform_role: String,
    pub is_approved: bool,
    /// `password` or the external identity provider name.
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterReq {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePlatformRoleReq {
    #[schema(example = "admin")]
    pub role: String,
}

// --- access requests ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessRequestDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitAccessRequestReq {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListAccessRequestsQuery {
    /// `pending`, `approved` or `rejected`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RejectAccessRequestReq {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApprovedAccessRequestDto {
    pub request: AccessRequestDto,
    pub user: UserDto,
    /// Soft failures, e.g. the credential mail could not be delivered.
    pub warnings: Vec<String>,
}

// --- workspaces and members ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub invite_code: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceWithRoleDto {
    pub workspace: WorkspaceDto,
    #[schema(example = "member")]
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWorkspaceReq {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateWorkspaceReq {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AuthorizeQuery {
    /// `manage_workspace`, `delete_workspace`, `manage_members` or `view_only`.
    pub capability: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthzDecisionDto {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub capability: String,
    pub allowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MembershipDto {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "member")]
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberDto {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddMemberReq {
    pub user_id: Uuid,
    /// Defaults to `member`.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeMemberRoleReq {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferOwnershipReq {
    pub user_id: Uuid,
}

// --- invitations ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvitationDto {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub email: String,
    pub role: String,
    pub inviter_id: Uuid,
    #[schema(example = "pending")]
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub accepted_by: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateInvitationReq {
    pub email: String,
    /// Defaults to `member`; `owner` is rejected.
    pub role: Option<String>,
}

/// The raw token appears only in this response and in the invitation mail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuedInvitationDto {
    pub invitation: InvitationDto,
    pub token: String,
    pub accept_url: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvitePreviewDto {
    pub workspace_id: Uuid,
    pub workspace_name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InviteAcceptanceDto {
    pub workspace: WorkspaceDto,
    pub membership: MembershipDto,
    /// `joined` or `already_member`.
    pub outcome: String,
}

// --- notifications ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationDto {
    pub id: Uuid,
    #[serde(rename = "type")]
    #[schema(example = "task_assigned")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub workspace_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListNotificationsQuery {
    pub limit: Option<u32>,
    pub unread_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountDto {
    pub unread: u64,
}

/// Number of rows touched by a bulk operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkResultDto {
    pub affected: u64,
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        let auth = match &u.credential {
            Credential::Password(_) => "password".to_string(),
            Credential::External(provider) => provider.clone(),
        };
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            avatar_url: u.avatar_url,
            platform_role: u.platform_role.to_string(),
            is_approved: u.is_approved,
            auth,
            created_at: u.created_at,
        }
    }
}

impl From<RegisterReq> for NewUser {
    fn from(req: RegisterReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
        }
    }
}

impl From<AccessRequest> for AccessRequestDto {
    fn from(r: AccessRequest) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            company: r.company,
            message: r.message,
            status: r.status.to_string(),
            rejection_reason: r.rejection_reason,
            created_at: r.created_at,
            reviewed_at: r.reviewed_at,
            reviewed_by: r.reviewed_by,
        }
    }
}

impl From<SubmitAccessRequestReq> for NewAccessRequest {
    fn from(req: SubmitAccessRequestReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
            company: req.company,
            message: req.message,
        }
    }
}

impl From<Workspace> for WorkspaceDto {
    fn from(w: Workspace) -> Self {
        Self {
            id: w.id,
            name: w.name,
            description: w.description,
            owner_id: w.owner_id,
            invite_code: w.invite_code,
            is_private: w.is_private,
            created_at: w.created_at,
        }
    }
}

impl From<(Workspace, Membership)> for WorkspaceWithRoleDto {
    fn from((w, m): (Workspace, Membership)) -> Self {
        Self {
            workspace: w.into(),
            role: m.role.to_string(),
            joined_at: m.joined_at,
        }
    }
}

impl From<CreateWorkspaceReq> for NewWorkspace {
    fn from(req: CreateWorkspaceReq) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

impl From<UpdateWorkspaceReq> for WorkspacePatch {
    fn from(req: UpdateWorkspaceReq) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

impl From<Membership> for MembershipDto {
    fn from(m: Membership) -> Self {
        Self {
            workspace_id: m.workspace_id,
            user_id: m.user_id,
            role: m.role.to_string(),
            joined_at: m.joined_at,
        }
    }
}

impl From<MemberProfile> for MemberDto {
    fn from(p: MemberProfile) -> Self {
        Self {
            user_id: p.membership.user_id,
            name: p.name,
            email: p.email,
            avatar_url: p.avatar_url,
            role: p.membership.role.to_string(),
            joined_at: p.membership.joined_at,
        }
    }
}

impl From<Invitation> for InvitationDto {
    fn from(i: Invitation) -> Self {
        Self {
            id: i.id,
            workspace_id: i.workspace_id,
            email: i.email,
            role: i.role.to_string(),
            inviter_id: i.inviter_id,
            status: i.status.to_string(),
            expires_at: i.expires_at,
            created_at: i.created_at,
            accepted_by: i.accepted_by,
            accepted_at: i.accepted_at,
        }
    }
}

impl IssuedInvitationDto {
    pub fn new(issued: IssuedInvitation, warnings: Vec<String>) -> Self {
        Self {
            invitation: issued.invitation.into(),
            token: issued.token,
            accept_url: issued.accept_url,
            warnings,
        }
    }
}

impl From<InvitePreview> for InvitePreviewDto {
    fn from(p: InvitePreview) -> Self {
        Self {
            workspace_id: p.workspace_id,
            workspace_name: p.workspace_name,
            email: p.email,
            role: p.role.to_string(),
            status: p.status.to_string(),
            expires_at: p.expires_at,
        }
    }
}

impl From<InviteAcceptance> for InviteAcceptanceDto {
    fn from(a: InviteAcceptance) -> Self {
        let outcome = match a.outcome {
            AcceptOutcome::Joined => "joined",
            AcceptOutcome::AlreadyMember => "already_member",
        };
        Self {
            workspace: a.workspace.into(),
            membership: a.membership.into(),
            outcome: outcome.to_string(),
        }
    }
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind.to_string(),
            title: n.title,
            message: n.message,
            link: n.link,
            workspace_id: n.workspace_id,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}
