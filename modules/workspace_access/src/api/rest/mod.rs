pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

use utoipa::OpenApi;

/// OpenAPI document for the workspace access REST surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register,
        handlers::login,
        handlers::submit_access_request,
        handlers::list_access_requests,
        handlers::approve_access_request,
        handlers::reject_access_request,
        handlers::list_users,
        handlers::approve_user,
        handlers::change_platform_role,
        handlers::delete_user,
        handlers::create_workspace,
        handlers::list_workspaces,
        handlers::get_workspace,
        handlers::update_workspace,
        handlers::delete_workspace,
        handlers::authorize,
        handlers::list_members,
        handlers::add_member,
        handlers::change_member_role,
        handlers::remove_member,
        handlers::transfer_ownership,
        handlers::regenerate_invite_code,
        handlers::list_invitations,
        handlers::create_invitation,
        handlers::preview_invitation,
        handlers::accept_invitation,
        handlers::join_by_code,
        handlers::list_notifications,
        handlers::unread_count,
        handlers::mark_read,
        handlers::mark_all_read,
        handlers::dismiss_notification,
        handlers::clear_notifications,
    ),
    components(schemas(api_problem::Problem)),
    tags(
        (name = "auth", description = "Sign-up and credential checks"),
        (name = "access-requests", description = "Waitlist review"),
        (name = "users", description = "Account administration"),
        (name = "workspaces", description = "Workspace lifecycle and authorization"),
        (name = "members", description = "Workspace membership"),
        (name = "invitations", description = "Invite tokens and invite codes"),
        (name = "notifications", description = "Polling notifications"),
    )
)]
pub struct WorkspaceAccessDoc;
