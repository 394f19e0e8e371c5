use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use super::{insert_membership_if_absent, SeaOrmRepository};
use crate::contract::model::{Invitation, InvitationStatus, Membership};
use crate::domain::repo::{Consumption, InvitationsRepository};
use crate::infra::storage::entity::invitation;
use crate::infra::storage::mapper;

#[async_trait]
impl InvitationsRepository for SeaOrmRepository {
    async fn insert(&self, inv: Invitation, token_hash: String) -> anyhow::Result<()> {
        let _ = mapper::invitation_to_active(inv, token_hash)
            .insert(&self.conn)
            .await
            .context("insert invitation failed")?;
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> anyhow::Result<Option<Invitation>> {
        let found = invitation::Entity::find()
            .filter(invitation::Column::TokenHash.eq(token_hash))
            .one(&self.conn)
            .await
            .context("find invitation by token failed")?;
        found.map(mapper::invitation_from_entity).transpose()
    }

    async fn list_for_workspace(&self, workspace_id: Uuid) -> anyhow::Result<Vec<Invitation>> {
        let rows = invitation::Entity::find()
            .filter(invitation::Column::WorkspaceId.eq(workspace_id))
            .order_by_desc(invitation::Column::CreatedAt)
            .order_by_desc(invitation::Column::Id)
            .all(&self.conn)
            .await
            .context("list invitations failed")?;
        mapper::collect(rows, mapper::invitation_from_entity)
    }

    async fn mark_expired(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = invitation::Entity::update_many()
            .col_expr(
                invitation::Column::Status,
                Expr::value(InvitationStatus::Expired.as_str()),
            )
            .filter(invitation::Column::Id.eq(id))
            .filter(invitation::Column::Status.eq(InvitationStatus::Pending.as_str()))
            .exec(&self.conn)
            .await
            .context("expire invitation failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn consume(
        &self,
        inv: &Invitation,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Consumption> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let flipped = invitation::Entity::update_many()
            .col_expr(
                invitation::Column::Status,
                Expr::value(InvitationStatus::Accepted.as_str()),
            )
            .col_expr(invitation::Column::AcceptedBy, Expr::value(user_id))
            .col_expr(invitation::Column::AcceptedAt, Expr::value(at))
            .filter(invitation::Column::Id.eq(inv.id))
            .filter(invitation::Column::Status.eq(InvitationStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .context("consume invitation failed")?;
        if flipped.rows_affected == 0 {
            return Ok(Consumption::NotPending);
        }

        let (membership, created) = insert_membership_if_absent(
            &txn,
            Membership {
                workspace_id: inv.workspace_id,
                user_id,
                role: inv.role,
                joined_at: at,
            },
        )
        .await?;

        txn.commit().await.context("commit failed")?;
        Ok(Consumption::Consumed {
            membership,
            created,
        })
    }
}
