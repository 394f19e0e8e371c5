use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{normalize_email, validate_email, validate_name, Service};
use crate::contract::model::{Credential, NewUser, PlatformRole, User};
use crate::domain::error::DomainError;
use crate::domain::events::AccessDomainEvent;
use crate::domain::repo::UserConflict;
use crate::domain::secrets;

const MIN_PASSWORD_LENGTH: usize = 8;

impl Service {
    /// Self sign-up. Accounts start waitlisted, except the very first one on
    /// an empty instance which becomes the approved platform owner.
    #[instrument(
        name = "workspace_access.service.register",
        skip(self, new_user),
        fields(email = %new_user.email)
    )]
    pub async fn register(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Registering user");

        let name = validate_name("name", &new_user.name)?;
        let email = normalize_email(&new_user.email);
        validate_email(&email)?;
        if new_user.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::validation(
                "password",
                format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }

        if self.repos.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::EmailAlreadyExists { email });
        }

        let waitlisted = User {
            id: Uuid::new_v4(),
            name,
            email,
            credential: Credential::Password(secrets::hash_password(&new_user.password)?),
            avatar_url: None,
            platform_role: PlatformRole::Member,
            is_approved: false,
            created_at: Utc::now(),
        };

        // The store admits one platform owner, so of two first sign-ups racing
        // on an empty instance the loser lands on the waitlist.
        let user = if self.repos.users.count().await? == 0 {
            let owner = User {
                platform_role: PlatformRole::Owner,
                is_approved: true,
                ..waitlisted.clone()
            };
            match self.repos.users.insert(owner.clone()).await {
                Ok(()) => owner,
                Err(e) if e.downcast_ref::<UserConflict>() == Some(&UserConflict::OwnerTaken) => {
                    debug!("Platform owner claimed concurrently");
                    self.repos.users.insert(waitlisted.clone()).await?;
                    waitlisted
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            self.repos.users.insert(waitlisted.clone()).await?;
            waitlisted
        };

        if user.platform_role == PlatformRole::Owner {
            info!(user_id = %user.id, "Bootstrapped first account as platform owner");
            self.provision_personal_workspace(&user).await;
        }

        self.events.publish(&AccessDomainEvent::UserRegistered {
            id: user.id,
            at: user.created_at,
        });
        info!(user_id = %user.id, approved = user.is_approved, "Registered user");
        Ok(user)
    }

    /// Password check. A correct password on a waitlisted account yields
    /// `PendingApproval` so the client can tell the two apart.
    #[instrument(name = "workspace_access.service.authenticate", skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = normalize_email(email);
        let user = self
            .repos
            .users
            .find_by_email(&email)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let verified = match &user.credential {
            Credential::Password(phc) => secrets::verify_password(password, phc),
            Credential::External(_) => false,
        };
        if !verified {
            debug!("Credential mismatch");
            return Err(DomainError::InvalidCredentials);
        }
        if !user.is_account_usable() {
            return Err(DomainError::PendingApproval { email: user.email });
        }

        debug!(user_id = %user.id, "Authenticated");
        Ok(user)
    }

    #[instrument(name = "workspace_access.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        debug!("Getting user by id");
        self.repos
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(name = "workspace_access.service.list_users", skip(self), fields(actor = %actor))]
    pub async fn list_users(&self, actor: Uuid) -> Result<Vec<User>, DomainError> {
        self.require_platform_role(actor, &[PlatformRole::Owner, PlatformRole::Admin])
            .await?;
        let users = self.repos.users.list().await?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    /// Idempotent: approving an approved account is a successful no-op.
    #[instrument(
        name = "workspace_access.service.approve_user",
        skip(self),
        fields(actor = %actor, user_id = %user_id)
    )]
    pub async fn approve_user(&self, actor: Uuid, user_id: Uuid) -> Result<User, DomainError> {
        self.require_platform_role(actor, &[PlatformRole::Owner, PlatformRole::Admin])
            .await?;
        let target = self.get_user(user_id).await?;

        if !self.repos.users.set_approved(user_id).await? {
            debug!("Account already approved");
            return Ok(target);
        }

        let user = User {
            is_approved: true,
            ..target
        };
        self.provision_personal_workspace(&user).await;
        self.events.publish(&AccessDomainEvent::UserApproved {
            id: user.id,
            at: Utc::now(),
        });
        info!("Approved user account");
        Ok(user)
    }

    /// Moves an account between `Member` and `Admin`. `Owner` is never granted
    /// here and the last remaining owner cannot be demoted.
    #[instrument(
        name = "workspace_access.service.change_platform_role",
        skip(self),
        fields(actor = %actor, user_id = %user_id, role = %role)
    )]
    pub async fn change_platform_role(
        &self,
        actor: Uuid,
        user_id: Uuid,
        role: PlatformRole,
    ) -> Result<User, DomainError> {
        self.require_platform_role(actor, &[PlatformRole::Owner])
            .await?;
        if role == PlatformRole::Owner {
            return Err(DomainError::validation(
                "role",
                "the platform owner role cannot be granted",
            ));
        }

        let target = self.get_user(user_id).await?;
        if target.platform_role == role {
            return Ok(target);
        }
        if target.platform_role == PlatformRole::Owner
            && self.repos.users.count_with_role(PlatformRole::Owner).await? <= 1
        {
            return Err(DomainError::LastPlatformOwner);
        }

        if !self.repos.users.set_platform_role(user_id, role).await? {
            return Err(DomainError::user_not_found(user_id));
        }
        info!(from = %target.platform_role, "Changed platform role");
        Ok(User {
            platform_role: role,
            ..target
        })
    }

    /// The platform owner may delete anyone; everyone else only themself.
    #[instrument(
        name = "workspace_access.service.delete_user",
        skip(self),
        fields(actor = %actor, user_id = %user_id)
    )]
    pub async fn delete_user(&self, actor: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        let acting = self.require_actor(Some(actor)).await?;
        if acting.id != user_id && acting.platform_role != PlatformRole::Owner {
            return Err(DomainError::forbidden(
                "only the platform owner can delete other accounts",
            ));
        }

        let target = self.get_user(user_id).await?;
        if target.platform_role == PlatformRole::Owner
            && self.repos.users.count_with_role(PlatformRole::Owner).await? <= 1
        {
            return Err(DomainError::LastPlatformOwner);
        }

        if !self.repos.users.delete_cascade(user_id).await? {
            return Err(DomainError::user_not_found(user_id));
        }
        self.events.publish(&AccessDomainEvent::UserDeleted {
            id: user_id,
            at: Utc::now(),
        });
        info!("Deleted user with cascade");
        Ok(())
    }
}
