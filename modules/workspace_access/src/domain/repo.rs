use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{
    AccessRequest, AccessRequestStatus, Invitation, MemberProfile, Membership, Notification,
    PlatformRole, User, Workspace, WorkspaceRole,
};

/// Persistence operations on the account ledger.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// `email` is expected in its stored, lower-cased form.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn count(&self) -> anyhow::Result<u64>;
    async fn count_with_role(&self, role: PlatformRole) -> anyhow::Result<u64>;
    /// Fails with [`UserConflict`] when the email is taken, or when `user` is
    /// a platform owner and the instance already has one.
    async fn insert(&self, user: User) -> anyhow::Result<()>;
    /// Flip `is_approved` from false to true. Returns false if the account was
    /// already approved (or does not exist).
    async fn set_approved(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn set_platform_role(&self, id: Uuid, role: PlatformRole) -> anyhow::Result<bool>;
    /// All accounts, oldest first.
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    /// Delete the account with its memberships, its notifications and every
    /// workspace it owns (each with its own cascade). Single transaction.
    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Unique-key conflicts the account store reports in a typed form, carried
/// inside the `anyhow::Error` so callers can downcast them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserConflict {
    #[error("email '{0}' is already registered")]
    Email(String),
    #[error("the platform owner account already exists")]
    OwnerTaken,
}

/// What approving an access request did to the account ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionedAccount {
    /// No account existed for the email; the candidate was inserted.
    Created(User),
    /// An unapproved account existed and was approved.
    Approved(User),
    /// An approved account already existed; left untouched.
    Existing(User),
}

impl ProvisionedAccount {
    pub fn user(&self) -> &User {
        match self {
            Self::Created(u) | Self::Approved(u) | Self::Existing(u) => u,
        }
    }

    pub fn into_user(self) -> User {
        match self {
            Self::Created(u) | Self::Approved(u) | Self::Existing(u) => u,
        }
    }

    /// Whether this approval is the account's first transition to usable.
    pub fn newly_usable(&self) -> bool {
        !matches!(self, Self::Existing(_))
    }
}

#[derive(Debug, Clone)]
pub struct Review {
    pub reviewer: Uuid,
    pub at: DateTime<Utc>,
}

#[async_trait]
pub trait AccessRequestsRepository: Send + Sync {
    async fn insert(&self, request: AccessRequest) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<AccessRequest>>;
    /// Newest first, optionally filtered by status.
    async fn list(&self, status: Option<AccessRequestStatus>) -> anyhow::Result<Vec<AccessRequest>>;
    /// Conditionally flip `pending -> approved` and provision the account for
    /// the request's email in the same transaction. `candidate` is inserted
    /// only when no account with that email exists.
    /// Returns `None` when the request was no longer pending.
    async fn approve(
        &self,
        id: Uuid,
        review: Review,
        candidate: User,
    ) -> anyhow::Result<Option<(AccessRequest, ProvisionedAccount)>>;
    /// Conditionally flip `pending -> rejected`. Returns `None` when the request
    /// was no longer pending.
    async fn reject(
        &self,
        id: Uuid,
        review: Review,
        reason: Option<String>,
    ) -> anyhow::Result<Option<AccessRequest>>;
}

#[async_trait]
pub trait WorkspacesRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Workspace>>;
    async fn find_by_invite_code(&self, code: &str) -> anyhow::Result<Option<Workspace>>;
    /// Insert the workspace together with its single `Owner` membership.
    async fn insert_with_owner(&self, workspace: Workspace) -> anyhow::Result<Membership>;
    async fn update(&self, workspace: Workspace) -> anyhow::Result<()>;
    /// Workspace row plus its memberships, invitations and scoped notifications.
    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Every workspace `user_id` belongs to, with the membership it holds there.
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<(Workspace, Membership)>>;

    async fn find_membership(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Membership>>;
    /// The idempotent membership insert every join flow goes through.
    /// Returns the stored row and whether this call created it.
    async fn insert_membership_if_absent(
        &self,
        membership: Membership,
    ) -> anyhow::Result<(Membership, bool)>;
    /// Members joined with their user profile, by join time.
    async fn list_members(&self, workspace_id: Uuid) -> anyhow::Result<Vec<MemberProfile>>;
    async fn update_membership_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> anyhow::Result<bool>;
    async fn delete_membership(&self, workspace_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
    /// Atomically demote the current owner to `Admin`, promote `to` to `Owner`
    /// and move the workspace owner reference.
    async fn transfer_ownership(&self, workspace_id: Uuid, from: Uuid, to: Uuid)
        -> anyhow::Result<()>;
}

/// Result of the single-use token consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumption {
    Consumed { membership: Membership, created: bool },
    /// Another acceptor (or expiry) got there first; nothing was written.
    NotPending,
}

#[async_trait]
pub trait InvitationsRepository: Send + Sync {
    async fn insert(&self, invitation: Invitation, token_hash: String) -> anyhow::Result<()>;
    async fn find_by_token_hash(&self, token_hash: &str) -> anyhow::Result<Option<Invitation>>;
    /// Newest first.
    async fn list_for_workspace(&self, workspace_id: Uuid) -> anyhow::Result<Vec<Invitation>>;
    /// Conditionally flip `pending -> expired`.
    async fn mark_expired(&self, id: Uuid) -> anyhow::Result<bool>;
    /// One transaction: conditional `pending -> accepted` followed by the
    /// idempotent membership insert. Rolls back entirely on failure.
    async fn consume(
        &self,
        invitation: &Invitation,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Consumption>;
}

#[async_trait]
pub trait NotificationsRepository: Send + Sync {
    async fn insert(&self, notification: Notification) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Notification>>;
    /// Newest first (`created_at DESC, id DESC`).
    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        limit: u64,
        unread_only: bool,
    ) -> anyhow::Result<Vec<Notification>>;
    async fn count_unread(&self, recipient_id: Uuid) -> anyhow::Result<u64>;
    async fn mark_read(&self, id: Uuid) -> anyhow::Result<()>;
    async fn mark_all_read(&self, recipient_id: Uuid) -> anyhow::Result<u64>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Single `DELETE ... WHERE recipient_id = ?` statement.
    async fn delete_all_for(&self, recipient_id: Uuid) -> anyhow::Result<u64>;
}

/// The storage ports the service is wired with.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UsersRepository>,
    pub access_requests: Arc<dyn AccessRequestsRepository>,
    pub workspaces: Arc<dyn WorkspacesRepository>,
    pub invitations: Arc<dyn InvitationsRepository>,
    pub notifications: Arc<dyn NotificationsRepository>,
}

impl Repositories {
    /// Wire every port to the same adapter.
    pub fn from_shared<R>(repo: Arc<R>) -> Self
    where
        R: UsersRepository
            + AccessRequestsRepository
            + WorkspacesRepository
            + InvitationsRepository
            + NotificationsRepository
            + 'static,
    {
        Self {
            users: repo.clone(),
            access_requests: repo.clone(),
            workspaces: repo.clone(),
            invitations: repo.clone(),
            notifications: repo,
        }
    }
}
