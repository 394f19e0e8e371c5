use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{non_blank, Service};
use crate::contract::model::{NewNotification, Notification, NotificationQuery};
use crate::domain::error::DomainError;

const MAX_TITLE_LENGTH: usize = 200;

impl Service {
    /// Always stores a new unread record; there is no dedup.
    #[instrument(
        name = "workspace_access.service.notify",
        skip(self, note),
        fields(recipient_id = %note.recipient_id, kind = %note.kind)
    )]
    pub async fn notify(&self, note: NewNotification) -> Result<Notification, DomainError> {
        let title = note.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(DomainError::validation(
                "title",
                format!("must be at most {MAX_TITLE_LENGTH} characters"),
            ));
        }
        if self
            .repos
            .users
            .find_by_id(note.recipient_id)
            .await?
            .is_none()
        {
            return Err(DomainError::user_not_found(note.recipient_id));
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: note.recipient_id,
            workspace_id: note.workspace_id,
            kind: note.kind,
            title,
            message: note.message.trim().to_string(),
            link: non_blank(note.link),
            is_read: false,
            created_at: Utc::now(),
        };
        self.repos
            .notifications
            .insert(notification.clone())
            .await?;
        debug!(notification_id = %notification.id, "Notification recorded");
        Ok(notification)
    }

    /// Newest first. The limit defaults to the configured page size and is
    /// clamped to the maximum.
    #[instrument(
        name = "workspace_access.service.list_notifications",
        skip(self),
        fields(actor = %actor)
    )]
    pub async fn list_notifications(
        &self,
        actor: Uuid,
        query: NotificationQuery,
    ) -> Result<Vec<Notification>, DomainError> {
        let recipient = self.require_actor(Some(actor)).await?;
        let items = self
            .repos
            .notifications
            .list_for_recipient(recipient.id, self.page_limit(query.limit), query.unread_only)
            .await?;
        debug!("Listed {} notifications", items.len());
        Ok(items)
    }

    #[instrument(name = "workspace_access.service.unread_count", skip(self), fields(actor = %actor))]
    pub async fn unread_count(&self, actor: Uuid) -> Result<u64, DomainError> {
        let recipient = self.require_actor(Some(actor)).await?;
        Ok(self.repos.notifications.count_unread(recipient.id).await?)
    }

    /// Idempotent for the recipient; anyone else gets `Forbidden` and the
    /// record is left untouched.
    #[instrument(
        name = "workspace_access.service.mark_read",
        skip(self),
        fields(actor = %actor, notification_id = %id)
    )]
    pub async fn mark_read(&self, actor: Uuid, id: Uuid) -> Result<Notification, DomainError> {
        let recipient = self.require_actor(Some(actor)).await?;
        let notification = self.owned_notification(id, recipient.id).await?;
        if notification.is_read {
            return Ok(notification);
        }
        self.repos.notifications.mark_read(id).await?;
        Ok(Notification {
            is_read: true,
            ..notification
        })
    }

    #[instrument(name = "workspace_access.service.mark_all_read", skip(self), fields(actor = %actor))]
    pub async fn mark_all_read(&self, actor: Uuid) -> Result<u64, DomainError> {
        let recipient = self.require_actor(Some(actor)).await?;
        let updated = self.repos.notifications.mark_all_read(recipient.id).await?;
        info!(updated, "Marked all notifications read");
        Ok(updated)
    }

    #[instrument(
        name = "workspace_access.service.dismiss",
        skip(self),
        fields(actor = %actor, notification_id = %id)
    )]
    pub async fn dismiss(&self, actor: Uuid, id: Uuid) -> Result<(), DomainError> {
        let recipient = self.require_actor(Some(actor)).await?;
        self.owned_notification(id, recipient.id).await?;
        if !self.repos.notifications.delete(id).await? {
            return Err(DomainError::not_found("Notification", id));
        }
        debug!("Notification dismissed");
        Ok(())
    }

    /// One bulk delete. A `notify` racing with it is either cleared or
    /// survives whole.
    #[instrument(name = "workspace_access.service.clear_all", skip(self), fields(actor = %actor))]
    pub async fn clear_all(&self, actor: Uuid) -> Result<u64, DomainError> {
        let recipient = self.require_actor(Some(actor)).await?;
        let removed = self
            .repos
            .notifications
            .delete_all_for(recipient.id)
            .await?;
        info!(removed, "Cleared notifications");
        Ok(removed)
    }

    async fn owned_notification(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Notification, DomainError> {
        let notification = self
            .repos
            .notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Notification", id))?;
        if notification.recipient_id != recipient_id {
            return Err(DomainError::forbidden(
                "notifications can only be changed by their recipient",
            ));
        }
        Ok(notification)
    }
}
