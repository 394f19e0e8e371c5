use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Extension, Router,
};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount every workspace access route on `router`.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let routes = Router::new()
        // accounts
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/users", get(handlers::list_users))
        .route("/users/{id}", delete(handlers::delete_user))
        .route("/users/{id}/approve", post(handlers::approve_user))
        .route("/users/{id}/role", put(handlers::change_platform_role))
        // access requests
        .route(
            "/access-requests",
            post(handlers::submit_access_request).get(handlers::list_access_requests),
        )
        .route(
            "/access-requests/{id}/approve",
            post(handlers::approve_access_request),
        )
        .route(
            "/access-requests/{id}/reject",
            post(handlers::reject_access_request),
        )
        // workspaces
        .route(
            "/workspaces",
            post(handlers::create_workspace).get(handlers::list_workspaces),
        )
        .route(
            "/workspaces/{id}",
            get(handlers::get_workspace)
                .patch(handlers::update_workspace)
                .delete(handlers::delete_workspace),
        )
        .route("/workspaces/{id}/authorize", get(handlers::authorize))
        .route(
            "/workspaces/{id}/members",
            get(handlers::list_members).post(handlers::add_member),
        )
        .route(
            "/workspaces/{id}/members/{user_id}",
            put(handlers::change_member_role).delete(handlers::remove_member),
        )
        .route(
            "/workspaces/{id}/transfer-ownership",
            post(handlers::transfer_ownership),
        )
        .route(
            "/workspaces/{id}/invite-code",
            post(handlers::regenerate_invite_code),
        )
        .route(
            "/workspaces/{id}/invitations",
            get(handlers::list_invitations).post(handlers::create_invitation),
        )
        // invitations
        .route("/invitations/{token}", get(handlers::preview_invitation))
        .route(
            "/invitations/{token}/accept",
            post(handlers::accept_invitation),
        )
        .route("/join/{code}", post(handlers::join_by_code))
        // notifications
        .route(
            "/notifications",
            get(handlers::list_notifications).delete(handlers::clear_notifications),
        )
        .route(
            "/notifications/unread-count",
            get(handlers::unread_count),
        )
        .route("/notifications/read-all", post(handlers::mark_all_read))
        .route(
            "/notifications/{id}",
            delete(handlers::dismiss_notification),
        )
        .route("/notifications/{id}/read", post(handlers::mark_read))
        .layer(Extension(service));

    router.merge(routes)
}
