use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Failed to parse one of the closed enumerations below from its wire/storage form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// Platform-wide role carried by the user account itself.
    PlatformRole, "platform role" {
        Owner => "owner",
        Admin => "admin",
        Member => "member",
    }
);

string_enum!(
    /// Role held inside one workspace; unrelated to [`PlatformRole`].
    WorkspaceRole, "workspace role" {
        Owner => "owner",
        Admin => "admin",
        Member => "member",
        Viewer => "viewer",
    }
);

string_enum!(
    /// What a workspace-scoped operation requires of the acting member.
    Capability, "capability" {
        ManageWorkspace => "manage_workspace",
        DeleteWorkspace => "delete_workspace",
        ManageMembers => "manage_members",
        ViewOnly => "view_only",
    }
);

string_enum!(
    AccessRequestStatus, "access request status" {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

string_enum!(
    InvitationStatus, "invitation status" {
        Pending => "pending",
        Accepted => "accepted",
        Expired => "expired",
    }
);

string_enum!(
    NotificationKind, "notification type" {
        TaskAssigned => "task_assigned",
        TaskUpdated => "task_updated",
        WorkspaceInvite => "workspace_invite",
        MemberJoined => "member_joined",
        System => "system",
    }
);

/// Result of the authorization primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzDecision {
    Allow,
    Deny,
}

impl AuthzDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, AuthzDecision::Allow)
    }
}

/// How the account proves its identity.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Argon2 PHC string.
    Password(String),
    /// Identity asserted by an external provider (e.g. "google").
    External(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password(_) => f.write_str("Password(<redacted>)"),
            Credential::External(provider) => f.debug_tuple("External").field(provider).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub credential: Credential,
    pub avatar_url: Option<String>,
    pub platform_role: PlatformRole,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Only approved accounts may act; the role is irrelevant here.
    pub fn is_account_usable(&self) -> bool {
        self.is_approved
    }
}

/// Self sign-up data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: Option<String>,
    pub status: AccessRequestStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessRequest {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// The accountable owner; always mirrors the single `Owner` membership.
    pub owner_id: Uuid,
    pub invite_code: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkspace {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkspacePatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    pub joined_at: DateTime<Utc>,
}

/// A membership joined with the display fields of its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    pub membership: Membership,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub email: String,
    pub role: WorkspaceRole,
    pub inviter_id: Uuid,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub accepted_by: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitation {
    pub email: String,
    pub role: WorkspaceRole,
}

/// A freshly created invitation together with its raw token.
/// The token is only ever available here; storage keeps a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedInvitation {
    pub invitation: Invitation,
    pub token: String,
    pub accept_url: String,
}

/// What an unauthenticated client may learn about a token before signing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitePreview {
    pub workspace_id: Uuid,
    pub workspace_name: String,
    pub email: String,
    pub role: WorkspaceRole,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// A new membership was created.
    Joined,
    /// The user already belonged to the workspace; the token is still consumed.
    AlreadyMember,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteAcceptance {
    pub workspace: Workspace,
    pub membership: Membership,
    pub outcome: AcceptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub workspace_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub workspace_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationQuery {
    pub limit: Option<u32>,
    pub unread_only: bool,
}

/// A successful result that may carry soft warnings, e.g. a mail that could
/// not be delivered after the record itself was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warnings.extend(warning);
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_their_own_rendering() {
        for role in WorkspaceRole::ALL {
            assert_eq!(role.as_str().parse::<WorkspaceRole>().unwrap(), *role);
        }
        for kind in NotificationKind::ALL {
            assert_eq!(kind.to_string().parse::<NotificationKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn unknown_values_are_rejected_not_defaulted() {
        let err = "Admin".parse::<WorkspaceRole>().unwrap_err();
        assert_eq!(err.kind, "workspace role");
        assert_eq!(err.value, "Admin");
        assert!("superuser".parse::<PlatformRole>().is_err());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let c = Credential::Password("$argon2id$v=19$secret".into());
        assert_eq!(format!("{c:?}"), "Password(<redacted>)");
    }

    #[test]
    fn outcome_collects_only_present_warnings() {
        let o = Outcome::clean(1)
            .with_warning(None)
            .with_warning(Some("mail relay unreachable".into()))
            .map(|v| v + 1);
        assert_eq!(o.value, 2);
        assert_eq!(o.warnings, vec!["mail relay unreachable".to_string()]);
    }
}
