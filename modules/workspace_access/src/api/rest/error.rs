use api_problem::{ErrDef, ProblemResponse};
use serde_json::json;

use crate::domain::error::DomainError;

/// Error catalog for the workspace access REST surface.
pub mod catalog {
    use api_problem::ErrDef;

    pub const NOT_FOUND: ErrDef = ErrDef { status: 404, title: "Not found", code: "WA_NOT_FOUND" };
    pub const FORBIDDEN: ErrDef = ErrDef { status: 403, title: "Forbidden", code: "WA_FORBIDDEN" };
    pub const AUTH_REQUIRED: ErrDef = ErrDef {
        status: 401,
        title: "Authentication required",
        code: "WA_AUTH_REQUIRED",
    };
    pub const INVALID_CREDENTIALS: ErrDef = ErrDef {
        status: 401,
        title: "Invalid credentials",
        code: "WA_INVALID_CREDENTIALS",
    };
    pub const PENDING_APPROVAL: ErrDef = ErrDef {
        status: 403,
        title: "Account pending approval",
        code: "WA_PENDING_APPROVAL",
    };
    pub const INVALID_STATE: ErrDef = ErrDef {
        status: 409,
        title: "Invalid state transition",
        code: "WA_INVALID_STATE",
    };
    pub const INVITE_CONSUMED: ErrDef = ErrDef {
        status: 409,
        title: "Invitation already used",
        code: "WA_INVITE_CONSUMED",
    };
    pub const INVITE_EXPIRED: ErrDef = ErrDef {
        status: 410,
        title: "Invitation expired",
        code: "WA_INVITE_EXPIRED",
    };
    pub const INVALID_CODE: ErrDef = ErrDef {
        status: 404,
        title: "Invalid invite code",
        code: "WA_INVALID_CODE",
    };
    pub const WORKSPACE_PRIVATE: ErrDef = ErrDef {
        status: 409,
        title: "Workspace is private",
        code: "WA_WORKSPACE_PRIVATE",
    };
    pub const CANNOT_REMOVE_OWNER: ErrDef = ErrDef {
        status: 409,
        title: "Owner cannot be removed",
        code: "WA_CANNOT_REMOVE_OWNER",
    };
    pub const LAST_OWNER: ErrDef = ErrDef {
        status: 409,
        title: "Last platform owner",
        code: "WA_LAST_OWNER",
    };
    pub const EMAIL_CONFLICT: ErrDef = ErrDef {
        status: 409,
        title: "Email already exists",
        code: "WA_EMAIL_CONFLICT",
    };
    pub const VALIDATION: ErrDef = ErrDef {
        status: 400,
        title: "Validation error",
        code: "WA_VALIDATION",
    };
    pub const INTERNAL: ErrDef = ErrDef {
        status: 500,
        title: "Internal error",
        code: "WA_INTERNAL",
    };
}

fn def_for(e: &DomainError) -> ErrDef {
    match e {
        DomainError::NotFound { .. } => catalog::NOT_FOUND,
        DomainError::Forbidden { .. } => catalog::FORBIDDEN,
        DomainError::AuthenticationRequired => catalog::AUTH_REQUIRED,
        DomainError::InvalidCredentials => catalog::INVALID_CREDENTIALS,
        DomainError::PendingApproval { .. } => catalog::PENDING_APPROVAL,
        DomainError::InvalidStateTransition { .. } => catalog::INVALID_STATE,
        DomainError::AlreadyConsumed { .. } => catalog::INVITE_CONSUMED,
        DomainError::Expired { .. } => catalog::INVITE_EXPIRED,
        DomainError::InvalidInviteCode { .. } => catalog::INVALID_CODE,
        DomainError::WorkspaceIsPrivate { .. } => catalog::WORKSPACE_PRIVATE,
        DomainError::CannotRemoveOwner { .. } => catalog::CANNOT_REMOVE_OWNER,
        DomainError::LastPlatformOwner => catalog::LAST_OWNER,
        DomainError::EmailAlreadyExists { .. } => catalog::EMAIL_CONFLICT,
        DomainError::Validation { .. } => catalog::VALIDATION,
        DomainError::Database { .. } | DomainError::Internal { .. } => catalog::INTERNAL,
    }
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    let def = def_for(e);
    match e {
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            def.respond("An internal error occurred", instance)
        }
        DomainError::Internal { .. } => {
            tracing::error!(error = ?e, "Internal error occurred");
            def.respond("An internal error occurred", instance)
        }
        DomainError::AlreadyConsumed {
            workspace_id: Some(workspace_id),
        } => {
            let ProblemResponse(problem) = def.respond(e.to_string(), instance);
            ProblemResponse(problem.with_extension("workspace_id", json!(workspace_id)))
        }
        DomainError::Validation { field, .. } => {
            let ProblemResponse(problem) = def.respond(e.to_string(), instance);
            ProblemResponse(problem.with_extension("field", json!(field)))
        }
        _ => {
            tracing::debug!(code = def.code, error = %e, "Request rejected");
            def.respond(e.to_string(), instance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn internal_errors_hide_details() {
        let resp = map_domain_error(&DomainError::database("disk I/O error"), "/workspaces");
        assert_eq!(resp.0.status, 500);
        assert_eq!(resp.0.code, "WA_INTERNAL");
        assert!(!resp.0.detail.contains("disk"));
    }

    #[test]
    fn crypto_failures_render_as_internal() {
        let resp = map_domain_error(
            &DomainError::internal("password hashing failed: bad params"),
            "/auth/register",
        );
        assert_eq!(resp.0.status, 500);
        assert_eq!(resp.0.code, "WA_INTERNAL");
        assert!(!resp.0.detail.contains("hashing"));
    }

    #[test]
    fn consumed_invitation_carries_redirect_target() {
        let ws = Uuid::new_v4();
        let resp = map_domain_error(
            &DomainError::AlreadyConsumed {
                workspace_id: Some(ws),
            },
            "/invitations/x/accept",
        );
        assert_eq!(resp.0.status, 409);
        assert_eq!(
            resp.0.extensions.unwrap()["workspace_id"],
            json!(ws.to_string())
        );
    }

    #[test]
    fn expiry_is_gone() {
        let resp = map_domain_error(
            &DomainError::Expired {
                expired_at: chrono::Utc::now(),
            },
            "/invitations/x/accept",
        );
        assert_eq!(resp.0.status, 410);
        assert_eq!(resp.0.type_url, "https://errors.workhub.dev/WA_INVITE_EXPIRED");
    }
}
