use anyhow::Context;
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use super::{delete_workspace_rows, is_unique_violation, SeaOrmRepository};
use crate::contract::model::{PlatformRole, User};
use crate::domain::repo::{UserConflict, UsersRepository};
use crate::infra::storage::entity::{membership, notification, user, workspace};
use crate::infra::storage::mapper;

#[async_trait]
impl UsersRepository for SeaOrmRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let found = user::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find user by id failed")?;
        found.map(mapper::user_from_entity).transpose()
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find user by email failed")?;
        found.map(mapper::user_from_entity).transpose()
    }

    async fn count(&self) -> anyhow::Result<u64> {
        user::Entity::find()
            .count(&self.conn)
            .await
            .context("count users failed")
    }

    async fn count_with_role(&self, role: PlatformRole) -> anyhow::Result<u64> {
        user::Entity::find()
            .filter(user::Column::PlatformRole.eq(role.as_str()))
            .count(&self.conn)
            .await
            .context("count users by role failed")
    }

    async fn insert(&self, u: User) -> anyhow::Result<()> {
        let email = u.email.clone();
        let is_owner = u.platform_role == PlatformRole::Owner;
        let err = match mapper::user_to_active(u).insert(&self.conn).await {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };
        if !is_unique_violation(&err) {
            return Err(anyhow::Error::new(err).context("insert user failed"));
        }

        // Two keys can trip: users.email and the single-owner index.
        if is_owner && self.find_by_email(&email).await?.is_none() {
            return Err(UserConflict::OwnerTaken.into());
        }
        Err(UserConflict::Email(email).into())
    }

    async fn set_approved(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = user::Entity::update_many()
            .col_expr(user::Column::IsApproved, Expr::value(true))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::IsApproved.eq(false))
            .exec(&self.conn)
            .await
            .context("approve user failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn set_platform_role(&self, id: Uuid, role: PlatformRole) -> anyhow::Result<bool> {
        let res = user::Entity::update_many()
            .col_expr(user::Column::PlatformRole, Expr::value(role.as_str()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("set platform role failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let rows = user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(&self.conn)
            .await
            .context("list users failed")?;
        mapper::collect(rows, mapper::user_from_entity)
    }

    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let owned = workspace::Entity::find()
            .filter(workspace::Column::OwnerId.eq(id))
            .all(&txn)
            .await
            .context("load owned workspaces failed")?;
        for ws in owned {
            delete_workspace_rows(&txn, ws.id).await?;
        }

        notification::Entity::delete_many()
            .filter(notification::Column::RecipientId.eq(id))
            .exec(&txn)
            .await
            .context("delete user notifications failed")?;
        membership::Entity::delete_many()
            .filter(membership::Column::UserId.eq(id))
            .exec(&txn)
            .await
            .context("delete user memberships failed")?;
        let res = user::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete user failed")?;

        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected > 0)
    }
}
