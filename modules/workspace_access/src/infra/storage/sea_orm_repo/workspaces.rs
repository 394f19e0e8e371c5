use anyhow::{bail, Context};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use super::{delete_workspace_rows, insert_membership_if_absent, SeaOrmRepository};
use crate::contract::model::{MemberProfile, Membership, Workspace, WorkspaceRole};
use crate::domain::repo::WorkspacesRepository;
use crate::infra::storage::entity::{membership, user, workspace};
use crate::infra::storage::mapper;

#[async_trait]
impl WorkspacesRepository for SeaOrmRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Workspace>> {
        let found = workspace::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find workspace failed")?;
        Ok(found.map(mapper::workspace_from_entity))
    }

    async fn find_by_invite_code(&self, code: &str) -> anyhow::Result<Option<Workspace>> {
        let found = workspace::Entity::find()
            .filter(workspace::Column::InviteCode.eq(code))
            .one(&self.conn)
            .await
            .context("find workspace by invite code failed")?;
        Ok(found.map(mapper::workspace_from_entity))
    }

    async fn insert_with_owner(&self, ws: Workspace) -> anyhow::Result<Membership> {
        let owner = Membership {
            workspace_id: ws.id,
            user_id: ws.owner_id,
            role: WorkspaceRole::Owner,
            joined_at: ws.created_at,
        };

        let txn = self.conn.begin().await.context("begin failed")?;
        let _ = mapper::workspace_to_active(ws)
            .insert(&txn)
            .await
            .context("insert workspace failed")?;
        let (membership, _) = insert_membership_if_absent(&txn, owner).await?;
        txn.commit().await.context("commit failed")?;
        Ok(membership)
    }

    async fn update(&self, ws: Workspace) -> anyhow::Result<()> {
        let _ = mapper::workspace_to_active(ws)
            .update(&self.conn)
            .await
            .context("update workspace failed")?;
        Ok(())
    }

    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin failed")?;
        let deleted = delete_workspace_rows(&txn, id).await?;
        txn.commit().await.context("commit failed")?;
        Ok(deleted)
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<(Workspace, Membership)>> {
        let rows = membership::Entity::find()
            .filter(membership::Column::UserId.eq(user_id))
            .find_also_related(workspace::Entity)
            .order_by_asc(membership::Column::JoinedAt)
            .all(&self.conn)
            .await
            .context("list workspaces for user failed")?;

        rows.into_iter()
            .filter_map(|(m, ws)| ws.map(|ws| (m, ws)))
            .map(|(m, ws)| {
                Ok((
                    mapper::workspace_from_entity(ws),
                    mapper::membership_from_entity(m)?,
                ))
            })
            .collect()
    }

    async fn find_membership(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Membership>> {
        let found = membership::Entity::find_by_id((workspace_id, user_id))
            .one(&self.conn)
            .await
            .context("find membership failed")?;
        found.map(mapper::membership_from_entity).transpose()
    }

    async fn insert_membership_if_absent(
        &self,
        m: Membership,
    ) -> anyhow::Result<(Membership, bool)> {
        insert_membership_if_absent(&self.conn, m).await
    }

    async fn list_members(&self, workspace_id: Uuid) -> anyhow::Result<Vec<MemberProfile>> {
        let rows = membership::Entity::find()
            .filter(membership::Column::WorkspaceId.eq(workspace_id))
            .find_also_related(user::Entity)
            .order_by_asc(membership::Column::JoinedAt)
            .all(&self.conn)
            .await
            .context("list members failed")?;

        rows.into_iter()
            .filter_map(|(m, u)| u.map(|u| (m, u)))
            .map(|(m, u)| {
                Ok(MemberProfile {
                    membership: mapper::membership_from_entity(m)?,
                    name: u.name,
                    email: u.email,
                    avatar_url: u.avatar_url,
                })
            })
            .collect()
    }

    async fn update_membership_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> anyhow::Result<bool> {
        let res = membership::Entity::update_many()
            .col_expr(membership::Column::Role, Expr::value(role.as_str()))
            .filter(membership::Column::WorkspaceId.eq(workspace_id))
            .filter(membership::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("update membership role failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete_membership(&self, workspace_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let res = membership::Entity::delete_by_id((workspace_id, user_id))
            .exec(&self.conn)
            .await
            .context("delete membership failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn transfer_ownership(
        &self,
        workspace_id: Uuid,
        from: Uuid,
        to: Uuid,
    ) -> anyhow::Result<()> {
        let txn = self.conn.begin().await.context("begin failed")?;

        // Guarded on the current owner so two concurrent transfers cannot both apply.
        let moved = workspace::Entity::update_many()
            .col_expr(workspace::Column::OwnerId, Expr::value(to))
            .filter(workspace::Column::Id.eq(workspace_id))
            .filter(workspace::Column::OwnerId.eq(from))
            .exec(&txn)
            .await
            .context("move owner reference failed")?;
        if moved.rows_affected != 1 {
            bail!("workspace {workspace_id} is no longer owned by {from}");
        }

        for (user_id, role) in [(from, WorkspaceRole::Admin), (to, WorkspaceRole::Owner)] {
            let res = membership::Entity::update_many()
                .col_expr(membership::Column::Role, Expr::value(role.as_str()))
                .filter(membership::Column::WorkspaceId.eq(workspace_id))
                .filter(membership::Column::UserId.eq(user_id))
                .exec(&txn)
                .await
                .context("swap membership roles failed")?;
            if res.rows_affected != 1 {
                bail!("membership {workspace_id}/{user_id} missing during transfer");
            }
        }

        txn.commit().await.context("commit failed")?;
        Ok(())
    }
}
