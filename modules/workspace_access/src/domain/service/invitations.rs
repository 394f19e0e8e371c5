use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{normalize_email, validate_email, Service};
use crate::contract::model::{
    AcceptOutcome, Capability, Invitation, InvitationStatus, InviteAcceptance, InvitePreview,
    IssuedInvitation, NewInvitation, NewNotification, NotificationKind, Outcome,
};
use crate::domain::error::DomainError;
use crate::domain::events::AccessDomainEvent;
use crate::domain::ports::{MailMessage, MailTemplate};
use crate::domain::repo::Consumption;
use crate::domain::secrets;

impl Service {
    /// Issue a single-use token for `email`. The raw token is returned here
    /// and mailed; only its digest is stored.
    #[instrument(
        name = "workspace_access.service.create_invitation",
        skip(self, invite),
        fields(actor = %actor, workspace_id = %workspace_id, role = %invite.role)
    )]
    pub async fn create_invitation(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
        invite: NewInvitation,
    ) -> Result<Outcome<IssuedInvitation>, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let workspace = self.load_workspace(workspace_id).await?;
        Self::ensure_not_private(&workspace)?;
        self.require_capability(&workspace, &acting, Capability::ManageMembers)
            .await?;
        if !invite.role.is_assignable() {
            return Err(DomainError::validation(
                "role",
                "invitations cannot grant the owner role",
            ));
        }
        let email = normalize_email(&invite.email);
        validate_email(&email)?;

        let token = secrets::generate_invite_token();
        let now = Utc::now();
        let invitation = Invitation {
            id: Uuid::new_v4(),
            workspace_id,
            email,
            role: invite.role,
            inviter_id: acting.id,
            status: InvitationStatus::Pending,
            expires_at: now + self.config.invite_ttl,
            created_at: now,
            accepted_by: None,
            accepted_at: None,
        };
        self.repos
            .invitations
            .insert(invitation.clone(), secrets::token_digest(&token))
            .await?;

        let accept_url = self.link(&format!("/invite/{token}"));
        let mail = MailMessage::new(MailTemplate::WorkspaceInvitation, invitation.email.clone())
            .var("workspace_name", workspace.name.clone())
            .var("inviter_name", acting.name.clone())
            .var("role", invitation.role.as_str())
            .var("accept_url", accept_url.clone())
            .var("expires_at", invitation.expires_at.to_rfc3339());
        let warning = self.send_mail_soft(mail).await;

        // Existing accounts also see the invite in their notification center.
        if let Some(invitee) = self.repos.users.find_by_email(&invitation.email).await? {
            let note = NewNotification {
                recipient_id: invitee.id,
                workspace_id: Some(workspace_id),
                kind: NotificationKind::WorkspaceInvite,
                title: format!("Invitation to {}", workspace.name),
                message: format!(
                    "{} invited you to join {} as {}.",
                    acting.name, workspace.name, invitation.role
                ),
                link: Some(accept_url.clone()),
            };
            if let Err(e) = self.notify(note).await {
                warn!(error = %e, "Failed to record workspace_invite notification");
            }
        }

        self.events.publish(&AccessDomainEvent::InvitationIssued {
            id: invitation.id,
            workspace_id,
            at: now,
        });
        info!(invitation_id = %invitation.id, "Invitation issued");
        Ok(Outcome::clean(IssuedInvitation {
            invitation,
            token,
            accept_url,
        })
        .with_warning(warning))
    }

    #[instrument(
        name = "workspace_access.service.list_invitations",
        skip(self),
        fields(actor = %actor, workspace_id = %workspace_id)
    )]
    pub async fn list_invitations(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<Invitation>, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let workspace = self.load_workspace(workspace_id).await?;
        self.require_capability(&workspace, &acting, Capability::ManageMembers)
            .await?;
        let invitations = self
            .repos
            .invitations
            .list_for_workspace(workspace_id)
            .await?;
        debug!("Listed {} invitations", invitations.len());
        Ok(invitations)
    }

    /// Unauthenticated lookup shown before the sign-in redirect. Status
    /// reflects expiry even if no acceptance was attempted yet.
    #[instrument(name = "workspace_access.service.preview_invite", skip_all)]
    pub async fn preview_invite(&self, token: &str) -> Result<InvitePreview, DomainError> {
        let invitation = self.load_invitation(token).await?;
        let workspace = self.load_workspace(invitation.workspace_id).await?;
        let status = match invitation.status {
            InvitationStatus::Pending if Utc::now() >= invitation.expires_at => {
                InvitationStatus::Expired
            }
            other => other,
        };
        Ok(InvitePreview {
            workspace_id: workspace.id,
            workspace_name: workspace.name,
            email: invitation.email,
            role: invitation.role,
            status,
            expires_at: invitation.expires_at,
        })
    }

    /// Accept a token on behalf of the session's user.
    ///
    /// The token is judged before the session: a valid pending token with no
    /// session yields `AuthenticationRequired` so the client can keep it and
    /// replay it after sign-in. Consumption is a single transaction, so of two
    /// concurrent acceptors exactly one wins.
    #[instrument(
        name = "workspace_access.service.accept_invite",
        skip(self, token),
        fields(actor = ?actor)
    )]
    pub async fn accept_invite(
        &self,
        token: &str,
        actor: Option<Uuid>,
    ) -> Result<InviteAcceptance, DomainError> {
        let invitation = self.load_invitation(token).await?;
        let now = Utc::now();

        match invitation.status {
            InvitationStatus::Accepted => {
                return Err(self.already_consumed(&invitation, actor).await?);
            }
            InvitationStatus::Expired => {
                return Err(DomainError::Expired {
                    expired_at: invitation.expires_at,
                });
            }
            InvitationStatus::Pending if now >= invitation.expires_at => {
                self.repos.invitations.mark_expired(invitation.id).await?;
                info!(invitation_id = %invitation.id, "Invitation expired on acceptance");
                return Err(DomainError::Expired {
                    expired_at: invitation.expires_at,
                });
            }
            InvitationStatus::Pending => {}
        }

        let acting = self.require_actor(actor).await?;
        if self.config.enforce_invite_email && acting.email != invitation.email {
            return Err(DomainError::forbidden(
                "this invitation was issued to a different email address",
            ));
        }
        let workspace = self.load_workspace(invitation.workspace_id).await?;
        Self::ensure_not_private(&workspace)?;

        let (membership, created) = match self
            .repos
            .invitations
            .consume(&invitation, acting.id, now)
            .await?
        {
            Consumption::Consumed {
                membership,
                created,
            } => (membership, created),
            Consumption::NotPending => {
                debug!("Lost the race for the invitation");
                return Err(self.already_consumed(&invitation, Some(acting.id)).await?);
            }
        };

        self.events.publish(&AccessDomainEvent::InvitationAccepted {
            id: invitation.id,
            workspace_id: workspace.id,
            user_id: acting.id,
            at: now,
        });
        let outcome = if created {
            self.events.publish(&AccessDomainEvent::MemberJoined {
                workspace_id: workspace.id,
                user_id: acting.id,
                role: membership.role,
                at: membership.joined_at,
            });
            self.notify_member_joined(&workspace, invitation.inviter_id, &acting)
                .await;
            AcceptOutcome::Joined
        } else {
            AcceptOutcome::AlreadyMember
        };

        info!(invitation_id = %invitation.id, ?outcome, "Invitation accepted");
        Ok(InviteAcceptance {
            workspace,
            membership,
            outcome,
        })
    }

    async fn load_invitation(&self, token: &str) -> Result<Invitation, DomainError> {
        self.repos
            .invitations
            .find_by_token_hash(&secrets::token_digest(token))
            .await?
            .ok_or_else(|| DomainError::not_found("Invitation", "token"))
    }

    /// `AlreadyConsumed`, carrying the workspace id when the presenter already
    /// belongs to it so the client can redirect instead of showing an error.
    async fn already_consumed(
        &self,
        invitation: &Invitation,
        actor: Option<Uuid>,
    ) -> Result<DomainError, DomainError> {
        let is_member = match actor {
            Some(user_id) => self
                .repos
                .workspaces
                .find_membership(invitation.workspace_id, user_id)
                .await?
                .is_some(),
            None => false,
        };
        Ok(DomainError::AlreadyConsumed {
            workspace_id: is_member.then_some(invitation.workspace_id),
        })
    }
}
