use anyhow::Context;
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use super::{is_unique_violation, SeaOrmRepository};
use crate::contract::model::{AccessRequest, AccessRequestStatus, User};
use crate::domain::repo::{AccessRequestsRepository, ProvisionedAccount, Review, UserConflict};
use crate::infra::storage::entity::{access_request, user};
use crate::infra::storage::mapper;

impl SeaOrmRepository {
    /// The `WHERE status = 'pending'` flip both reviews go through.
    async fn close_pending_request(
        txn: &DatabaseTransaction,
        id: Uuid,
        to: AccessRequestStatus,
        review: &Review,
        reason: Option<String>,
    ) -> anyhow::Result<Option<AccessRequest>> {
        let res = access_request::Entity::update_many()
            .col_expr(access_request::Column::Status, Expr::value(to.as_str()))
            .col_expr(access_request::Column::ReviewedAt, Expr::value(review.at))
            .col_expr(access_request::Column::ReviewedBy, Expr::value(review.reviewer))
            .col_expr(access_request::Column::RejectionReason, Expr::value(reason))
            .filter(access_request::Column::Id.eq(id))
            .filter(access_request::Column::Status.eq(AccessRequestStatus::Pending.as_str()))
            .exec(txn)
            .await
            .context("review access request failed")?;
        if res.rows_affected == 0 {
            return Ok(None);
        }

        let row = access_request::Entity::find_by_id(id)
            .one(txn)
            .await
            .context("reload access request failed")?
            .with_context(|| format!("access request {id} missing after review"))?;
        Ok(Some(mapper::access_request_from_entity(row)?))
    }
}

#[async_trait]
impl AccessRequestsRepository for SeaOrmRepository {
    async fn insert(&self, request: AccessRequest) -> anyhow::Result<()> {
        let _ = mapper::access_request_to_active(request)
            .insert(&self.conn)
            .await
            .context("insert access request failed")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<AccessRequest>> {
        let found = access_request::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find access request failed")?;
        found.map(mapper::access_request_from_entity).transpose()
    }

    async fn list(&self, status: Option<AccessRequestStatus>) -> anyhow::Result<Vec<AccessRequest>> {
        let mut query = access_request::Entity::find();
        if let Some(status) = status {
            query = query.filter(access_request::Column::Status.eq(status.as_str()));
        }
        let rows = query
            .order_by_desc(access_request::Column::CreatedAt)
            .order_by_desc(access_request::Column::Id)
            .all(&self.conn)
            .await
            .context("list access requests failed")?;
        mapper::collect(rows, mapper::access_request_from_entity)
    }

    async fn approve(
        &self,
        id: Uuid,
        review: Review,
        candidate: User,
    ) -> anyhow::Result<Option<(AccessRequest, ProvisionedAccount)>> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let Some(request) =
            Self::close_pending_request(&txn, id, AccessRequestStatus::Approved, &review, None)
                .await?
        else {
            return Ok(None);
        };

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.as_str()))
            .one(&txn)
            .await
            .context("find user for access request failed")?;

        let account = match existing {
            Some(row) if row.is_approved => ProvisionedAccount::Existing(mapper::user_from_entity(row)?),
            Some(row) => {
                user::Entity::update_many()
                    .col_expr(user::Column::IsApproved, Expr::value(true))
                    .filter(user::Column::Id.eq(row.id))
                    .exec(&txn)
                    .await
                    .context("approve existing user failed")?;
                let mut user = mapper::user_from_entity(row)?;
                user.is_approved = true;
                ProvisionedAccount::Approved(user)
            }
            None => {
                // A sign-up that lands between the lookup and this insert trips
                // the email key; dropping the transaction keeps the request pending.
                if let Err(e) = mapper::user_to_active(candidate.clone()).insert(&txn).await {
                    if is_unique_violation(&e) {
                        return Err(UserConflict::Email(candidate.email).into());
                    }
                    return Err(anyhow::Error::new(e).context("provision user failed"));
                }
                ProvisionedAccount::Created(candidate)
            }
        };

        txn.commit().await.context("commit failed")?;
        Ok(Some((request, account)))
    }

    async fn reject(
        &self,
        id: Uuid,
        review: Review,
        reason: Option<String>,
    ) -> anyhow::Result<Option<AccessRequest>> {
        let txn = self.conn.begin().await.context("begin failed")?;
        let request =
            Self::close_pending_request(&txn, id, AccessRequestStatus::Rejected, &review, reason)
                .await?;
        txn.commit().await.context("commit failed")?;
        Ok(request)
    }
}
