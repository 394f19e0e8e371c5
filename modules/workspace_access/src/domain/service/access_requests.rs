use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{non_blank, normalize_email, validate_email, validate_name, Service};
use crate::contract::model::{
    AccessRequest, AccessRequestStatus, Credential, NewAccessRequest, Outcome, PlatformRole, User,
};
use crate::domain::error::DomainError;
use crate::domain::events::AccessDomainEvent;
use crate::domain::ports::{MailMessage, MailTemplate};
use crate::domain::repo::{ProvisionedAccount, Review};
use crate::domain::secrets;

const MAX_MESSAGE_LENGTH: usize = 2_000;

impl Service {
    /// Anonymous intake; no session is required.
    #[instrument(
        name = "workspace_access.service.submit_request",
        skip(self, request),
        fields(email = %request.email)
    )]
    pub async fn submit_request(
        &self,
        request: NewAccessRequest,
    ) -> Result<AccessRequest, DomainError> {
        let name = validate_name("name", &request.name)?;
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        let message = non_blank(request.message);
        if message
            .as_ref()
            .is_some_and(|m| m.chars().count() > MAX_MESSAGE_LENGTH)
        {
            return Err(DomainError::validation(
                "message",
                format!("must be at most {MAX_MESSAGE_LENGTH} characters"),
            ));
        }

        let record = AccessRequest {
            id: Uuid::new_v4(),
            name,
            email,
            company: non_blank(request.company),
            message,
            status: AccessRequestStatus::Pending,
            rejection_reason: None,
            created_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        };
        self.repos.access_requests.insert(record.clone()).await?;
        info!(request_id = %record.id, "Access request submitted");
        Ok(record)
    }

    #[instrument(name = "workspace_access.service.list_requests", skip(self), fields(actor = %actor))]
    pub async fn list_requests(
        &self,
        actor: Uuid,
        status: Option<AccessRequestStatus>,
    ) -> Result<Vec<AccessRequest>, DomainError> {
        self.require_platform_role(actor, &[PlatformRole::Owner])
            .await?;
        let requests = self.repos.access_requests.list(status).await?;
        debug!("Listed {} access requests", requests.len());
        Ok(requests)
    }

    /// `pending -> approved`, provisioning (or approving) the account for the
    /// request's email and mailing the credential exactly once.
    #[instrument(
        name = "workspace_access.service.approve_request",
        skip(self),
        fields(actor = %actor, request_id = %request_id)
    )]
    pub async fn approve_request(
        &self,
        actor: Uuid,
        request_id: Uuid,
    ) -> Result<Outcome<(AccessRequest, User)>, DomainError> {
        let reviewer = self
            .require_platform_role(actor, &[PlatformRole::Owner])
            .await?;
        let current = self.load_request(request_id).await?;
        if current.status != AccessRequestStatus::Pending {
            return Err(DomainError::invalid_transition(
                "access request",
                current.status,
                "approve",
            ));
        }

        let password = secrets::generate_password(self.config.initial_password_length);
        let now = Utc::now();
        let candidate = User {
            id: Uuid::new_v4(),
            name: current.name.clone(),
            email: current.email.clone(),
            credential: Credential::Password(secrets::hash_password(&password)?),
            avatar_url: None,
            platform_role: PlatformRole::Member,
            is_approved: true,
            created_at: now,
        };
        let review = Review {
            reviewer: reviewer.id,
            at: now,
        };

        let Some((request, account)) = self
            .repos
            .access_requests
            .approve(request_id, review, candidate)
            .await?
        else {
            // A concurrent reviewer won the conditional update.
            let latest = self.load_request(request_id).await?;
            return Err(DomainError::invalid_transition(
                "access request",
                latest.status,
                "approve",
            ));
        };

        let provisioning = if account.newly_usable() {
            self.provision_personal_workspace(account.user()).await
        } else {
            None
        };

        let mail = MailMessage::new(MailTemplate::AccessGranted, account.user().email.clone())
            .var("name", account.user().name.clone())
            .var("login_url", self.link("/login"));
        let mail = match &account {
            ProvisionedAccount::Created(_) => mail.var("initial_password", password),
            ProvisionedAccount::Approved(_) | ProvisionedAccount::Existing(_) => mail,
        };
        let warning = self.send_mail_soft(mail).await;

        self.events.publish(&AccessDomainEvent::AccessRequestReviewed {
            id: request.id,
            approved: true,
            at: now,
        });
        info!(user_id = %account.user().id, "Access request approved");
        Ok(Outcome::clean((request, account.into_user()))
            .with_warning(provisioning)
            .with_warning(warning))
    }

    /// `pending -> rejected`; terminal.
    #[instrument(
        name = "workspace_access.service.reject_request",
        skip(self, reason),
        fields(actor = %actor, request_id = %request_id)
    )]
    pub async fn reject_request(
        &self,
        actor: Uuid,
        request_id: Uuid,
        reason: Option<String>,
    ) -> Result<AccessRequest, DomainError> {
        let reviewer = self
            .require_platform_role(actor, &[PlatformRole::Owner])
            .await?;
        let current = self.load_request(request_id).await?;
        if current.status != AccessRequestStatus::Pending {
            return Err(DomainError::invalid_transition(
                "access request",
                current.status,
                "reject",
            ));
        }

        let now = Utc::now();
        let review = Review {
            reviewer: reviewer.id,
            at: now,
        };
        let Some(request) = self
            .repos
            .access_requests
            .reject(request_id, review, non_blank(reason))
            .await?
        else {
            let latest = self.load_request(request_id).await?;
            return Err(DomainError::invalid_transition(
                "access request",
                latest.status,
                "reject",
            ));
        };

        self.events.publish(&AccessDomainEvent::AccessRequestReviewed {
            id: request.id,
            approved: false,
            at: now,
        });
        info!("Access request rejected");
        Ok(request)
    }

    async fn load_request(&self, id: Uuid) -> Result<AccessRequest, DomainError> {
        self.repos
            .access_requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("AccessRequest", id))
    }
}
