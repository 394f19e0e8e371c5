//! Domain service for workspace access: account ledger, access requests,
//! memberships, invitations and the notification center.
//!
//! The service depends only on the ports in [`crate::domain::repo`] and
//! [`crate::domain::ports`]; wiring to SeaORM and the mail relay lives in
//! `infra`. Operations are split by component across the submodules but all
//! hang off the single [`Service`] type.

mod access_requests;
mod identity;
mod invitations;
mod notifications;
mod workspaces;

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::WorkspaceAccessConfig;
use crate::contract::model::{Capability, Membership, PlatformRole, User, Workspace};
use crate::domain::error::DomainError;
use crate::domain::events::AccessDomainEvent;
use crate::domain::ports::{EventPublisher, MailMessage, MailSender};
use crate::domain::rbac;
use crate::domain::repo::Repositories;

/// Domain service with business rules for workspace access.
#[derive(Clone)]
pub struct Service {
    repos: Repositories,
    mailer: Arc<dyn MailSender>,
    events: Arc<dyn EventPublisher<AccessDomainEvent>>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub invite_ttl: Duration,
    pub invite_code_length: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub initial_password_length: usize,
    pub provision_personal_workspace: bool,
    pub enforce_invite_email: bool,
    pub public_base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from(&WorkspaceAccessConfig::default())
    }
}

impl From<&WorkspaceAccessConfig> for ServiceConfig {
    fn from(cfg: &WorkspaceAccessConfig) -> Self {
        Self {
            invite_ttl: Duration::hours(i64::from(cfg.invite_ttl_hours)),
            invite_code_length: cfg.invite_code_length.max(6),
            default_page_size: cfg.default_page_size,
            max_page_size: cfg.max_page_size,
            initial_password_length: cfg.initial_password_length.max(12),
            provision_personal_workspace: cfg.provision_personal_workspace,
            enforce_invite_email: cfg.enforce_invite_email,
            public_base_url: cfg.public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

const MAX_NAME_LENGTH: usize = 120;

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        repos: Repositories,
        mailer: Arc<dyn MailSender>,
        events: Arc<dyn EventPublisher<AccessDomainEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repos,
            mailer,
            events,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Resolve the session's user id into a usable account.
    async fn require_actor(&self, actor: Option<Uuid>) -> Result<User, DomainError> {
        let id = actor.ok_or(DomainError::AuthenticationRequired)?;
        let user = self
            .repos
            .users
            .find_by_id(id)
            .await?
            .ok_or(DomainError::AuthenticationRequired)?;
        if !user.is_account_usable() {
            return Err(DomainError::PendingApproval { email: user.email });
        }
        Ok(user)
    }

    async fn require_platform_role(
        &self,
        actor: Uuid,
        allowed: &[PlatformRole],
    ) -> Result<User, DomainError> {
        let user = self.require_actor(Some(actor)).await?;
        if !allowed.contains(&user.platform_role) {
            return Err(DomainError::forbidden(format!(
                "platform role '{}' may not perform this action",
                user.platform_role
            )));
        }
        Ok(user)
    }

    async fn load_workspace(&self, workspace_id: Uuid) -> Result<Workspace, DomainError> {
        self.repos
            .workspaces
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| DomainError::workspace_not_found(workspace_id))
    }

    /// The permission gate at the top of every workspace-scoped operation.
    async fn require_capability(
        &self,
        workspace: &Workspace,
        actor: &User,
        capability: Capability,
    ) -> Result<Membership, DomainError> {
        let membership = self
            .repos
            .workspaces
            .find_membership(workspace.id, actor.id)
            .await?;
        if !rbac::authorize(membership.as_ref(), capability).is_allowed() {
            debug!(workspace_id = %workspace.id, user_id = %actor.id, %capability, "authorization denied");
            return Err(DomainError::forbidden(format!(
                "missing capability '{capability}' in workspace {}",
                workspace.id
            )));
        }
        membership.ok_or_else(|| DomainError::forbidden("not a member of this workspace"))
    }

    fn ensure_not_private(workspace: &Workspace) -> Result<(), DomainError> {
        if workspace.is_private {
            return Err(DomainError::WorkspaceIsPrivate {
                workspace_id: workspace.id,
            });
        }
        Ok(())
    }

    /// Hand a message to the mail collaborator. A failure is reported back as
    /// a warning string and never undoes the state change that caused it.
    async fn send_mail_soft(&self, message: MailMessage) -> Option<String> {
        let template = message.template.as_str();
        let to = message.to.clone();
        match self.mailer.send(message).await {
            Ok(()) => {
                debug!(template, "mail handed to sender");
                None
            }
            Err(e) => {
                warn!(template, error = %e, "mail delivery failed");
                Some(format!("could not send '{template}' mail to {to}"))
            }
        }
    }

    fn link(&self, path: &str) -> String {
        format!("{}{}", self.config.public_base_url, path)
    }

    fn page_limit(&self, requested: Option<u32>) -> u64 {
        let limit = requested
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size.max(1));
        u64::from(limit)
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("email", format!("'{email}' is not a valid email address")));
    }
    Ok(())
}

fn validate_name(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::validation(
            field,
            format!("must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
