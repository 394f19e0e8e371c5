//! SeaORM-backed implementation of every storage port.
//!
//! One adapter holds the `DatabaseConnection` and implements the five
//! repository traits in the sibling files. Multi-row changes (cascading
//! deletes, token consumption, request approval, ownership transfer) open a
//! transaction and use only that transaction until commit; an error drops it,
//! which rolls back.

mod access_requests;
mod invitations;
mod notifications;
mod users;
mod workspaces;

use anyhow::Context;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr,
};
use uuid::Uuid;

use super::entity::{invitation, membership, notification, workspace};
use super::mapper;
use crate::contract::model::Membership;

/// SeaORM repository impl.
#[derive(Clone)]
pub struct SeaOrmRepository {
    conn: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}

/// `INSERT ... ON CONFLICT (workspace_id, user_id) DO NOTHING`, then read the
/// stored row back. Shared by direct adds, code joins and token acceptance so
/// every path relies on the same composite key.
pub(crate) async fn insert_membership_if_absent<C>(
    conn: &C,
    m: Membership,
) -> anyhow::Result<(Membership, bool)>
where
    C: ConnectionTrait,
{
    let key = (m.workspace_id, m.user_id);
    let inserted = membership::Entity::insert(mapper::membership_to_active(m))
        .on_conflict(
            OnConflict::columns([membership::Column::WorkspaceId, membership::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .context("insert membership failed")?;

    let stored = membership::Entity::find_by_id(key)
        .one(conn)
        .await
        .context("reload membership failed")?
        .with_context(|| format!("membership {}/{} missing after insert", key.0, key.1))?;
    Ok((mapper::membership_from_entity(stored)?, inserted > 0))
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Delete a workspace and everything scoped to it.
pub(crate) async fn delete_workspace_rows<C>(conn: &C, workspace_id: Uuid) -> anyhow::Result<bool>
where
    C: ConnectionTrait,
{
    notification::Entity::delete_many()
        .filter(notification::Column::WorkspaceId.eq(workspace_id))
        .exec(conn)
        .await
        .context("delete workspace notifications failed")?;
    invitation::Entity::delete_many()
        .filter(invitation::Column::WorkspaceId.eq(workspace_id))
        .exec(conn)
        .await
        .context("delete workspace invitations failed")?;
    membership::Entity::delete_many()
        .filter(membership::Column::WorkspaceId.eq(workspace_id))
        .exec(conn)
        .await
        .context("delete workspace memberships failed")?;
    let res = workspace::Entity::delete_by_id(workspace_id)
        .exec(conn)
        .await
        .context("delete workspace failed")?;
    Ok(res.rows_affected > 0)
}
