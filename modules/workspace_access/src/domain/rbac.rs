//! Capability resolution for workspace roles.
//!
//! Everything here is a pure lookup: no I/O, no clocks, no shared state. The
//! service loads the caller's membership and asks [`authorize`]; a caller with
//! no membership is denied whatever their platform role.

use crate::contract::model::{AuthzDecision, Capability, Membership, WorkspaceRole};

impl WorkspaceRole {
    /// Whether this role satisfies `capability`.
    pub fn grants(self, capability: Capability) -> bool {
        match (self, capability) {
            (WorkspaceRole::Owner, _) => true,
            (WorkspaceRole::Admin, Capability::DeleteWorkspace) => false,
            (WorkspaceRole::Admin, _) => true,
            (WorkspaceRole::Member | WorkspaceRole::Viewer, Capability::ViewOnly) => true,
            (WorkspaceRole::Member | WorkspaceRole::Viewer, _) => false,
        }
    }

    /// Roles that may be handed out through invitations, joins and role changes.
    /// `Owner` only moves through an ownership transfer.
    pub fn is_assignable(self) -> bool {
        !matches!(self, WorkspaceRole::Owner)
    }
}

pub fn authorize(membership: Option<&Membership>, capability: Capability) -> AuthzDecision {
    match membership {
        Some(m) if m.role.grants(capability) => AuthzDecision::Allow,
        _ => AuthzDecision::Deny,
    }
}
