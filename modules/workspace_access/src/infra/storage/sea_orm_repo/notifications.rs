use anyhow::Context;
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use super::SeaOrmRepository;
use crate::contract::model::Notification;
use crate::domain::repo::NotificationsRepository;
use crate::infra::storage::entity::notification;
use crate::infra::storage::mapper;

#[async_trait]
impl NotificationsRepository for SeaOrmRepository {
    async fn insert(&self, n: Notification) -> anyhow::Result<()> {
        let _ = mapper::notification_to_active(n)
            .insert(&self.conn)
            .await
            .context("insert notification failed")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Notification>> {
        let found = notification::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find notification failed")?;
        found.map(mapper::notification_from_entity).transpose()
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        limit: u64,
        unread_only: bool,
    ) -> anyhow::Result<Vec<Notification>> {
        let mut query =
            notification::Entity::find().filter(notification::Column::RecipientId.eq(recipient_id));
        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }
        let rows = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("list notifications failed")?;
        mapper::collect(rows, mapper::notification_from_entity)
    }

    async fn count_unread(&self, recipient_id: Uuid) -> anyhow::Result<u64> {
        notification::Entity::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.conn)
            .await
            .context("count unread notifications failed")
    }

    async fn mark_read(&self, id: Uuid) -> anyhow::Result<()> {
        notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("mark notification read failed")?;
        Ok(())
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> anyhow::Result<u64> {
        let res = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.conn)
            .await
            .context("mark all notifications read failed")?;
        Ok(res.rows_affected)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = notification::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete notification failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete_all_for(&self, recipient_id: Uuid) -> anyhow::Result<u64> {
        let res = notification::Entity::delete_many()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .exec(&self.conn)
            .await
            .context("clear notifications failed")?;
        Ok(res.rows_affected)
    }
}
