use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{non_blank, validate_name, Service};
use crate::contract::model::{
    AcceptOutcome, AuthzDecision, Capability, InviteAcceptance, MemberProfile, Membership,
    NewNotification, NewWorkspace, NotificationKind, User, Workspace, WorkspacePatch,
    WorkspaceRole,
};
use crate::domain::error::DomainError;
use crate::domain::events::AccessDomainEvent;
use crate::domain::rbac;
use crate::domain::secrets;

const INVITE_CODE_ATTEMPTS: usize = 5;

impl Service {
    /// Membership lookup plus the pure capability check; no side effects.
    #[instrument(
        name = "workspace_access.service.check_authorization",
        skip(self),
        fields(workspace_id = %workspace_id, user_id = %user_id, capability = %capability)
    )]
    pub async fn check_authorization(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        capability: Capability,
    ) -> Result<AuthzDecision, DomainError> {
        let membership = self
            .repos
            .workspaces
            .find_membership(workspace_id, user_id)
            .await?;
        Ok(rbac::authorize(membership.as_ref(), capability))
    }

    #[instrument(
        name = "workspace_access.service.create_workspace",
        skip(self, new_workspace),
        fields(actor = %actor)
    )]
    pub async fn create_workspace(
        &self,
        actor: Uuid,
        new_workspace: NewWorkspace,
    ) -> Result<Workspace, DomainError> {
        let owner = self.require_actor(Some(actor)).await?;
        let name = validate_name("name", &new_workspace.name)?;
        self.insert_workspace(&owner, name, non_blank(new_workspace.description), false)
            .await
    }

    /// The private single-member workspace every approved account starts with.
    /// Runs after the account change is committed, so a failure is reported
    /// as a warning and the account stays usable without the workspace.
    pub(super) async fn provision_personal_workspace(&self, user: &User) -> Option<String> {
        if !self.config.provision_personal_workspace {
            return None;
        }
        let name = format!("{}'s workspace", user.name);
        match self
            .insert_workspace(user, name, Some("Personal workspace".to_string()), true)
            .await
        {
            Ok(_) => None,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Personal workspace provisioning failed");
                Some(format!(
                    "could not create a personal workspace for {}",
                    user.email
                ))
            }
        }
    }

    async fn insert_workspace(
        &self,
        owner: &User,
        name: String,
        description: Option<String>,
        is_private: bool,
    ) -> Result<Workspace, DomainError> {
        let workspace = Workspace {
            id: Uuid::new_v4(),
            name,
            description,
            owner_id: owner.id,
            invite_code: self.fresh_invite_code().await?,
            is_private,
            created_at: Utc::now(),
        };
        self.repos
            .workspaces
            .insert_with_owner(workspace.clone())
            .await?;

        self.events.publish(&AccessDomainEvent::WorkspaceCreated {
            id: workspace.id,
            owner_id: owner.id,
            at: workspace.created_at,
        });
        info!(workspace_id = %workspace.id, is_private, "Created workspace");
        Ok(workspace)
    }

    async fn fresh_invite_code(&self) -> Result<String, DomainError> {
        for _ in 0..INVITE_CODE_ATTEMPTS {
            let code = secrets::generate_invite_code(self.config.invite_code_length);
            if self
                .repos
                .workspaces
                .find_by_invite_code(&code)
                .await?
                .is_none()
            {
                return Ok(code);
            }
            debug!("Invite code collision, retrying");
        }
        Err(DomainError::database("could not allocate a unique invite code"))
    }

    #[instrument(
        name = "workspace_access.service.get_workspace",
        skip(self),
        fields(actor = %actor, workspace_id = %workspace_id)
    )]
    pub async fn get_workspace(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
    ) -> Result<Workspace, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let workspace = self.load_workspace(workspace_id).await?;
        self.require_capability(&workspace, &acting, Capability::ViewOnly)
            .await?;
        Ok(workspace)
    }

    /// Workspaces the actor belongs to, with the role held in each.
    #[instrument(name = "workspace_access.service.list_workspaces", skip(self), fields(actor = %actor))]
    pub async fn list_workspaces(
        &self,
        actor: Uuid,
    ) -> Result<Vec<(Workspace, Membership)>, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let rows = self.repos.workspaces.list_for_user(acting.id).await?;
        debug!("Listed {} workspaces", rows.len());
        Ok(rows)
    }

    #[instrument(
        name = "workspace_access.service.update_workspace",
        skip(self, patch),
        fields(actor = %actor, workspace_id = %workspace_id)
    )]
    pub async fn update_workspace(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
        patch: WorkspacePatch,
    ) -> Result<Workspace, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let mut workspace = self.load_workspace(workspace_id).await?;
        self.require_capability(&workspace, &acting, Capability::ManageWorkspace)
            .await?;

        if let Some(name) = patch.name {
            workspace.name = validate_name("name", &name)?;
        }
        if let Some(description) = patch.description {
            workspace.description = non_blank(Some(description));
        }
        self.repos.workspaces.update(workspace.clone()).await?;
        info!("Updated workspace");
        Ok(workspace)
    }

    /// Replaces the shareable code; the old one stops working immediately.
    #[instrument(
        name = "workspace_access.service.regenerate_invite_code",
        skip(self),
        fields(actor = %actor, workspace_id = %workspace_id)
    )]
    pub async fn regenerate_invite_code(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
    ) -> Result<Workspace, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let mut workspace = self.load_workspace(workspace_id).await?;
        self.require_capability(&workspace, &acting, Capability::ManageWorkspace)
            .await?;

        workspace.invite_code = self.fresh_invite_code().await?;
        self.repos.workspaces.update(workspace.clone()).await?;
        info!("Regenerated invite code");
        Ok(workspace)
    }

    #[instrument(
        name = "workspace_access.service.delete_workspace",
        skip(self),
        fields(actor = %actor, workspace_id = %workspace_id)
    )]
    pub async fn delete_workspace(&self, actor: Uuid, workspace_id: Uuid) -> Result<(), DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let workspace = self.load_workspace(workspace_id).await?;
        self.require_capability(&workspace, &acting, Capability::DeleteWorkspace)
            .await?;

        if !self.repos.workspaces.delete_cascade(workspace_id).await? {
            return Err(DomainError::workspace_not_found(workspace_id));
        }
        self.events.publish(&AccessDomainEvent::WorkspaceDeleted {
            id: workspace_id,
            at: Utc::now(),
        });
        info!("Deleted workspace with cascade");
        Ok(())
    }

    #[instrument(
        name = "workspace_access.service.list_members",
        skip(self),
        fields(actor = %actor, workspace_id = %workspace_id)
    )]
    pub async fn list_members(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<MemberProfile>, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let workspace = self.load_workspace(workspace_id).await?;
        self.require_capability(&workspace, &acting, Capability::ViewOnly)
            .await?;
        let members = self.repos.workspaces.list_members(workspace_id).await?;
        debug!("Listed {} members", members.len());
        Ok(members)
    }

    /// Direct add by a member manager. Adding an existing member is a no-op
    /// that returns the stored membership unchanged.
    #[instrument(
        name = "workspace_access.service.add_member",
        skip(self),
        fields(actor = %actor, workspace_id = %workspace_id, user_id = %user_id, role = %role)
    )]
    pub async fn add_member(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<Membership, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let workspace = self.load_workspace(workspace_id).await?;
        Self::ensure_not_private(&workspace)?;
        self.require_capability(&workspace, &acting, Capability::ManageMembers)
            .await?;
        ensure_assignable(role)?;

        let target = self.get_user(user_id).await?;
        if !target.is_account_usable() {
            return Err(DomainError::PendingApproval {
                email: target.email,
            });
        }

        let (membership, created) = self.join(&workspace, target.id, role).await?;
        if created {
            self.notify_member_joined(&workspace, workspace.owner_id, &target)
                .await;
        }
        Ok(membership)
    }

    /// Removes `user_id`. Members may always remove themselves; removing
    /// anyone else takes `ManageMembers`. The owner can never be removed.
    #[instrument(
        name = "workspace_access.service.remove_member",
        skip(self),
        fields(actor = %actor, workspace_id = %workspace_id, user_id = %user_id)
    )]
    pub async fn remove_member(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let workspace = self.load_workspace(workspace_id).await?;
        Self::ensure_not_private(&workspace)?;
        if acting.id == user_id {
            self.require_capability(&workspace, &acting, Capability::ViewOnly)
                .await?;
        } else {
            self.require_capability(&workspace, &acting, Capability::ManageMembers)
                .await?;
        }
        if user_id == workspace.owner_id {
            return Err(DomainError::CannotRemoveOwner { workspace_id });
        }

        if !self
            .repos
            .workspaces
            .delete_membership(workspace_id, user_id)
            .await?
        {
            return Err(DomainError::not_found("Membership", user_id));
        }
        self.events.publish(&AccessDomainEvent::MemberRemoved {
            workspace_id,
            user_id,
            at: Utc::now(),
        });
        info!(left = acting.id == user_id, "Removed member");
        Ok(())
    }

    #[instrument(
        name = "workspace_access.service.change_member_role",
        skip(self),
        fields(actor = %actor, workspace_id = %workspace_id, user_id = %user_id, role = %role)
    )]
    pub async fn change_member_role(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<Membership, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let workspace = self.load_workspace(workspace_id).await?;
        Self::ensure_not_private(&workspace)?;
        self.require_capability(&workspace, &acting, Capability::ManageMembers)
            .await?;
        ensure_assignable(role)?;
        if user_id == workspace.owner_id {
            return Err(DomainError::forbidden(
                "the owner's role only changes through an ownership transfer",
            ));
        }

        let current = self
            .repos
            .workspaces
            .find_membership(workspace_id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Membership", user_id))?;
        if current.role == role {
            return Ok(current);
        }

        self.repos
            .workspaces
            .update_membership_role(workspace_id, user_id, role)
            .await?;
        info!(from = %current.role, "Changed member role");
        Ok(Membership { role, ..current })
    }

    /// Hands the workspace to an existing member. The previous owner stays on
    /// as `Admin`.
    #[instrument(
        name = "workspace_access.service.transfer_ownership",
        skip(self),
        fields(actor = %actor, workspace_id = %workspace_id, new_owner = %new_owner)
    )]
    pub async fn transfer_ownership(
        &self,
        actor: Uuid,
        workspace_id: Uuid,
        new_owner: Uuid,
    ) -> Result<Workspace, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let workspace = self.load_workspace(workspace_id).await?;
        Self::ensure_not_private(&workspace)?;
        if workspace.owner_id != acting.id {
            return Err(DomainError::forbidden(
                "only the workspace owner can transfer ownership",
            ));
        }
        if new_owner == acting.id {
            return Ok(workspace);
        }

        let target = self
            .repos
            .workspaces
            .find_membership(workspace_id, new_owner)
            .await?
            .ok_or_else(|| {
                DomainError::validation("user_id", "the new owner must already be a member")
            })?;
        let target_user = self.get_user(target.user_id).await?;
        if !target_user.is_account_usable() {
            return Err(DomainError::PendingApproval {
                email: target_user.email,
            });
        }

        self.repos
            .workspaces
            .transfer_ownership(workspace_id, acting.id, new_owner)
            .await?;
        self.events.publish(&AccessDomainEvent::OwnershipTransferred {
            workspace_id,
            from: acting.id,
            to: new_owner,
            at: Utc::now(),
        });
        info!("Transferred workspace ownership");
        Ok(Workspace {
            owner_id: new_owner,
            ..workspace
        })
    }

    /// Join through the shareable invite code with role `Member`.
    #[instrument(name = "workspace_access.service.join_by_code", skip(self, code), fields(actor = %actor))]
    pub async fn join_by_code(
        &self,
        actor: Uuid,
        code: &str,
    ) -> Result<InviteAcceptance, DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        let code = code.trim().to_uppercase();
        let workspace = self
            .repos
            .workspaces
            .find_by_invite_code(&code)
            .await?
            .ok_or(DomainError::InvalidInviteCode { code })?;
        Self::ensure_not_private(&workspace)?;

        let (membership, created) = self
            .join(&workspace, acting.id, WorkspaceRole::Member)
            .await?;
        if created {
            self.notify_member_joined(&workspace, workspace.owner_id, &acting)
                .await;
        }
        Ok(InviteAcceptance {
            workspace,
            membership,
            outcome: if created {
                AcceptOutcome::Joined
            } else {
                AcceptOutcome::AlreadyMember
            },
        })
    }

    /// Funnel for the direct-add and code-join flows onto the idempotent
    /// store primitive.
    async fn join(
        &self,
        workspace: &Workspace,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<(Membership, bool), DomainError> {
        let (membership, created) = self
            .repos
            .workspaces
            .insert_membership_if_absent(Membership {
                workspace_id: workspace.id,
                user_id,
                role,
                joined_at: Utc::now(),
            })
            .await?;
        if created {
            self.events.publish(&AccessDomainEvent::MemberJoined {
                workspace_id: workspace.id,
                user_id,
                role: membership.role,
                at: membership.joined_at,
            });
            info!(workspace_id = %workspace.id, %user_id, "Member joined");
        } else {
            debug!(workspace_id = %workspace.id, %user_id, "Already a member");
        }
        Ok((membership, created))
    }

    /// Tell `recipient` that `joined` arrived. Best effort: the membership is
    /// already committed.
    pub(super) async fn notify_member_joined(
        &self,
        workspace: &Workspace,
        recipient: Uuid,
        joined: &User,
    ) {
        if recipient == joined.id {
            return;
        }
        let note = NewNotification {
            recipient_id: recipient,
            workspace_id: Some(workspace.id),
            kind: NotificationKind::MemberJoined,
            title: format!("{} joined {}", joined.name, workspace.name),
            message: format!("{} <{}> is now a member of {}.", joined.name, joined.email, workspace.name),
            link: Some(self.link(&format!("/workspaces/{}", workspace.id))),
        };
        if let Err(e) = self.notify(note).await {
            warn!(error = %e, "Failed to record member_joined notification");
        }
    }
}

fn ensure_assignable(role: WorkspaceRole) -> Result<(), DomainError> {
    if !role.is_assignable() {
        return Err(DomainError::validation(
            "role",
            "the owner role is only granted by an ownership transfer",
        ));
    }
    Ok(())
}
