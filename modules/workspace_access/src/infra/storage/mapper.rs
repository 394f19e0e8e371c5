//! Conversions between SeaORM rows and contract models.
//!
//! Enumerations are stored as strings. A value that fails to parse means the
//! row was written by something other than this module and is surfaced as an
//! error, never defaulted.

use anyhow::{anyhow, Context};
use sea_orm::Set;

use super::entity::{access_request, invitation, membership, notification, user, workspace};
use crate::contract::model::{
    AccessRequest, Credential, Invitation, Membership, Notification, User, Workspace,
};

pub fn user_from_entity(m: user::Model) -> anyhow::Result<User> {
    let credential = match (m.password_hash, m.auth_provider) {
        (Some(hash), _) => Credential::Password(hash),
        (None, Some(provider)) => Credential::External(provider),
        (None, None) => return Err(anyhow!("user {} has no credential", m.id)),
    };
    Ok(User {
        id: m.id,
        name: m.name,
        email: m.email,
        credential,
        avatar_url: m.avatar_url,
        platform_role: m.platform_role.parse().context("users.platform_role")?,
        is_approved: m.is_approved,
        created_at: m.created_at,
    })
}

pub fn user_to_active(u: User) -> user::ActiveModel {
    let (password_hash, auth_provider) = match u.credential {
        Credential::Password(hash) => (Some(hash), None),
        Credential::External(provider) => (None, Some(provider)),
    };
    user::ActiveModel {
        id: Set(u.id),
        name: Set(u.name),
        email: Set(u.email),
        password_hash: Set(password_hash),
        auth_provider: Set(auth_provider),
        avatar_url: Set(u.avatar_url),
        platform_role: Set(u.platform_role.as_str().to_string()),
        is_approved: Set(u.is_approved),
        created_at: Set(u.created_at),
    }
}

pub fn access_request_from_entity(m: access_request::Model) -> anyhow::Result<AccessRequest> {
    Ok(AccessRequest {
        id: m.id,
        name: m.name,
        email: m.email,
        company: m.company,
        message: m.message,
        status: m.status.parse().context("access_requests.status")?,
        rejection_reason: m.rejection_reason,
        created_at: m.created_at,
        reviewed_at: m.reviewed_at,
        reviewed_by: m.reviewed_by,
    })
}

pub fn access_request_to_active(r: AccessRequest) -> access_request::ActiveModel {
    access_request::ActiveModel {
        id: Set(r.id),
        name: Set(r.name),
        email: Set(r.email),
        company: Set(r.company),
        message: Set(r.message),
        status: Set(r.status.as_str().to_string()),
        rejection_reason: Set(r.rejection_reason),
        created_at: Set(r.created_at),
        reviewed_at: Set(r.reviewed_at),
        reviewed_by: Set(r.reviewed_by),
    }
}

pub fn workspace_from_entity(m: workspace::Model) -> Workspace {
    Workspace {
        id: m.id,
        name: m.name,
        description: m.description,
        owner_id: m.owner_id,
        invite_code: m.invite_code,
        is_private: m.is_private,
        created_at: m.created_at,
    }
}

pub fn workspace_to_active(w: Workspace) -> workspace::ActiveModel {
    workspace::ActiveModel {
        id: Set(w.id),
        name: Set(w.name),
        description: Set(w.description),
        owner_id: Set(w.owner_id),
        invite_code: Set(w.invite_code),
        is_private: Set(w.is_private),
        created_at: Set(w.created_at),
    }
}

pub fn membership_from_entity(m: membership::Model) -> anyhow::Result<Membership> {
    Ok(Membership {
        workspace_id: m.workspace_id,
        user_id: m.user_id,
        role: m.role.parse().context("memberships.role")?,
        joined_at: m.joined_at,
    })
}

pub fn membership_to_active(m: Membership) -> membership::ActiveModel {
    membership::ActiveModel {
        workspace_id: Set(m.workspace_id),
        user_id: Set(m.user_id),
        role: Set(m.role.as_str().to_string()),
        joined_at: Set(m.joined_at),
    }
}

pub fn invitation_from_entity(m: invitation::Model) -> anyhow::Result<Invitation> {
    Ok(Invitation {
        id: m.id,
        workspace_id: m.workspace_id,
        email: m.email,
        role: m.role.parse().context("invitations.role")?,
        inviter_id: m.inviter_id,
        status: m.status.parse().context("invitations.status")?,
        expires_at: m.expires_at,
        created_at: m.created_at,
        accepted_by: m.accepted_by,
        accepted_at: m.accepted_at,
    })
}

pub fn invitation_to_active(i: Invitation, token_hash: String) -> invitation::ActiveModel {
    invitation::ActiveModel {
        id: Set(i.id),
        token_hash: Set(token_hash),
        workspace_id: Set(i.workspace_id),
        email: Set(i.email),
        role: Set(i.role.as_str().to_string()),
        inviter_id: Set(i.inviter_id),
        status: Set(i.status.as_str().to_string()),
        expires_at: Set(i.expires_at),
        created_at: Set(i.created_at),
        accepted_by: Set(i.accepted_by),
        accepted_at: Set(i.accepted_at),
    }
}

pub fn notification_from_entity(m: notification::Model) -> anyhow::Result<Notification> {
    Ok(Notification {
        id: m.id,
        recipient_id: m.recipient_id,
        workspace_id: m.workspace_id,
        kind: m.kind.parse().context("notifications.kind")?,
        title: m.title,
        message: m.message,
        link: m.link,
        is_read: m.is_read,
        created_at: m.created_at,
    })
}

pub fn notification_to_active(n: Notification) -> notification::ActiveModel {
    notification::ActiveModel {
        id: Set(n.id),
        recipient_id: Set(n.recipient_id),
        workspace_id: Set(n.workspace_id),
        kind: Set(n.kind.as_str().to_string()),
        title: Set(n.title),
        message: Set(n.message),
        link: Set(n.link),
        is_read: Set(n.is_read),
        created_at: Set(n.created_at),
    }
}

/// Map every row, failing on the first malformed one.
pub fn collect<M, T>(
    rows: Vec<M>,
    f: impl Fn(M) -> anyhow::Result<T>,
) -> anyhow::Result<Vec<T>> {
    rows.into_iter().map(f).collect()
}
