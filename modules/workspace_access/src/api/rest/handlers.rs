use std::sync::Arc;

use api_problem::{Problem, ProblemResponse};
use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::info;
use uuid::Uuid;

use crate::api::rest::auth::{CurrentUser, MaybeUser};
use crate::api::rest::dto::{
    parse_field, AccessRequestDto, AddMemberReq, ApprovedAccessRequestDto, AuthorizeQuery,
    AuthzDecisionDto, BulkResultDto, ChangeMemberRoleReq, ChangePlatformRoleReq,
    CreateInvitationReq, CreateWorkspaceReq, InvitationDto, InviteAcceptanceDto,
    InvitePreviewDto, IssuedInvitationDto, ListAccessRequestsQuery, ListNotificationsQuery,
    LoginReq, MemberDto, MembershipDto, NotificationDto, RegisterReq, RejectAccessRequestReq,
    SubmitAccessRequestReq, TransferOwnershipReq, UnreadCountDto, UpdateWorkspaceReq, UserDto,
    WorkspaceDto, WorkspaceWithRoleDto,
};
use crate::api::rest::error::map_domain_error;
use crate::contract::model::{
    AccessRequestStatus, Capability, NewInvitation, NotificationQuery, PlatformRole,
    WorkspaceRole,
};
use crate::domain::error::DomainError;
use crate::domain::service::Service;

type Svc = Extension<Arc<Service>>;

fn problem(uri: &Uri) -> impl Fn(DomainError) -> ProblemResponse + '_ {
    move |e| map_domain_error(&e, uri.path())
}

// --- auth ---

/// Self sign-up; the account stays waitlisted until approved.
#[utoipa::path(
    post, path = "/auth/register", tag = "auth",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = UserDto),
        (status = 400, description = "Validation error", body = Problem),
        (status = 409, description = "Email already registered", body = Problem),
    )
)]
pub async fn register(
    Extension(svc): Svc,
    uri: Uri,
    Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    info!("Registering account");
    let user = svc.register(req.into()).await.map_err(problem(&uri))?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post, path = "/auth/login", tag = "auth",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Credentials verified", body = UserDto),
        (status = 401, description = "Invalid credentials", body = Problem),
        (status = 403, description = "Account pending approval", body = Problem),
    )
)]
pub async fn login(
    Extension(svc): Svc,
    uri: Uri,
    Json(req): Json<LoginReq>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let user = svc
        .authenticate(&req.email, &req.password)
        .await
        .map_err(problem(&uri))?;
    Ok(Json(user.into()))
}

// --- access requests ---

#[utoipa::path(
    post, path = "/access-requests", tag = "access-requests",
    request_body = SubmitAccessRequestReq,
    responses(
        (status = 201, description = "Request recorded", body = AccessRequestDto),
        (status = 400, description = "Validation error", body = Problem),
    )
)]
pub async fn submit_access_request(
    Extension(svc): Svc,
    uri: Uri,
    Json(req): Json<SubmitAccessRequestReq>,
) -> Result<(StatusCode, Json<AccessRequestDto>), ProblemResponse> {
    info!("Submitting access request");
    let request = svc.submit_request(req.into()).await.map_err(problem(&uri))?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

#[utoipa::path(
    get, path = "/access-requests", tag = "access-requests",
    params(ListAccessRequestsQuery),
    responses(
        (status = 200, description = "Requests, newest first", body = [AccessRequestDto]),
        (status = 403, description = "Not the platform owner", body = Problem),
    )
)]
pub async fn list_access_requests(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<ListAccessRequestsQuery>,
    uri: Uri,
) -> Result<Json<Vec<AccessRequestDto>>, ProblemResponse> {
    let status = query
        .status
        .as_deref()
        .map(|s| parse_field::<AccessRequestStatus>("status", s))
        .transpose()
        .map_err(problem(&uri))?;
    let requests = svc.list_requests(actor, status).await.map_err(problem(&uri))?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post, path = "/access-requests/{id}/approve", tag = "access-requests",
    params(("id" = Uuid, Path, description = "Access request id")),
    responses(
        (status = 200, description = "Approved; account provisioned", body = ApprovedAccessRequestDto),
        (status = 404, description = "Unknown request", body = Problem),
        (status = 409, description = "Request already reviewed", body = Problem),
    )
)]
pub async fn approve_access_request(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<ApprovedAccessRequestDto>, ProblemResponse> {
    info!(request_id = %id, "Approving access request");
    let outcome = svc.approve_request(actor, id).await.map_err(problem(&uri))?;
    let (request, user) = outcome.value;
    Ok(Json(ApprovedAccessRequestDto {
        request: request.into(),
        user: user.into(),
        warnings: outcome.warnings,
    }))
}

#[utoipa::path(
    post, path = "/access-requests/{id}/reject", tag = "access-requests",
    params(("id" = Uuid, Path, description = "Access request id")),
    request_body = RejectAccessRequestReq,
    responses(
        (status = 200, description = "Rejected", body = AccessRequestDto),
        (status = 409, description = "Request already reviewed", body = Problem),
    )
)]
pub async fn reject_access_request(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<RejectAccessRequestReq>,
) -> Result<Json<AccessRequestDto>, ProblemResponse> {
    info!(request_id = %id, "Rejecting access request");
    let request = svc
        .reject_request(actor, id, req.reason)
        .await
        .map_err(problem(&uri))?;
    Ok(Json(request.into()))
}

// --- users ---

#[utoipa::path(
    get, path = "/users", tag = "users",
    responses(
        (status = 200, description = "All accounts", body = [UserDto]),
        (status = 403, description = "Not a platform owner or admin", body = Problem),
    )
)]
pub async fn list_users(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    uri: Uri,
) -> Result<Json<Vec<UserDto>>, ProblemResponse> {
    let users = svc.list_users(actor).await.map_err(problem(&uri))?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post, path = "/users/{id}/approve", tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account approved (idempotent)", body = UserDto),
        (status = 404, description = "Unknown user", body = Problem),
    )
)]
pub async fn approve_user(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<UserDto>, ProblemResponse> {
    let user = svc.approve_user(actor, id).await.map_err(problem(&uri))?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put, path = "/users/{id}/role", tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = ChangePlatformRoleReq,
    responses(
        (status = 200, description = "Role changed", body = UserDto),
        (status = 409, description = "Would remove the last platform owner", body = Problem),
    )
)]
pub async fn change_platform_role(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<ChangePlatformRoleReq>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let role = parse_field::<PlatformRole>("role", &req.role).map_err(problem(&uri))?;
    let user = svc
        .change_platform_role(actor, id, role)
        .await
        .map_err(problem(&uri))?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete, path = "/users/{id}", tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Account and its data deleted"),
        (status = 403, description = "Not allowed", body = Problem),
        (status = 409, description = "Last platform owner", body = Problem),
    )
)]
pub async fn delete_user(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!(user_id = %id, "Deleting account");
    svc.delete_user(actor, id).await.map_err(problem(&uri))?;
    Ok(StatusCode::NO_CONTENT)
}

// --- workspaces ---

#[utoipa::path(
    post, path = "/workspaces", tag = "workspaces",
    request_body = CreateWorkspaceReq,
    responses(
        (status = 201, description = "Workspace created; caller is owner", body = WorkspaceDto),
        (status = 401, description = "No session", body = Problem),
    )
)]
pub async fn create_workspace(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    uri: Uri,
    Json(req): Json<CreateWorkspaceReq>,
) -> Result<(StatusCode, Json<WorkspaceDto>), ProblemResponse> {
    let ws = svc
        .create_workspace(actor, req.into())
        .await
        .map_err(problem(&uri))?;
    Ok((StatusCode::CREATED, Json(ws.into())))
}

#[utoipa::path(
    get, path = "/workspaces", tag = "workspaces",
    responses((status = 200, description = "Workspaces the caller belongs to", body = [WorkspaceWithRoleDto]))
)]
pub async fn list_workspaces(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    uri: Uri,
) -> Result<Json<Vec<WorkspaceWithRoleDto>>, ProblemResponse> {
    let rows = svc.list_workspaces(actor).await.map_err(problem(&uri))?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get, path = "/workspaces/{id}", tag = "workspaces",
    params(("id" = Uuid, Path, description = "Workspace id")),
    responses(
        (status = 200, description = "Workspace", body = WorkspaceDto),
        (status = 403, description = "Not a member", body = Problem),
        (status = 404, description = "Unknown workspace", body = Problem),
    )
)]
pub async fn get_workspace(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<WorkspaceDto>, ProblemResponse> {
    let ws = svc.get_workspace(actor, id).await.map_err(problem(&uri))?;
    Ok(Json(ws.into()))
}

#[utoipa::path(
    patch, path = "/workspaces/{id}", tag = "workspaces",
    params(("id" = Uuid, Path, description = "Workspace id")),
    request_body = UpdateWorkspaceReq,
    responses(
        (status = 200, description = "Updated workspace", body = WorkspaceDto),
        (status = 403, description = "Missing manage_workspace", body = Problem),
    )
)]
pub async fn update_workspace(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<UpdateWorkspaceReq>,
) -> Result<Json<WorkspaceDto>, ProblemResponse> {
    let ws = svc
        .update_workspace(actor, id, req.into())
        .await
        .map_err(problem(&uri))?;
    Ok(Json(ws.into()))
}

#[utoipa::path(
    delete, path = "/workspaces/{id}", tag = "workspaces",
    params(("id" = Uuid, Path, description = "Workspace id")),
    responses(
        (status = 204, description = "Workspace deleted with its members, invitations and notifications"),
        (status = 403, description = "Missing delete_workspace", body = Problem),
    )
)]
pub async fn delete_workspace(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!(workspace_id = %id, "Deleting workspace");
    svc.delete_workspace(actor, id).await.map_err(problem(&uri))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/workspaces/{id}/authorize", tag = "workspaces",
    params(("id" = Uuid, Path, description = "Workspace id"), AuthorizeQuery),
    responses(
        (status = 200, description = "Decision for the caller", body = AuthzDecisionDto),
        (status = 400, description = "Unknown capability", body = Problem),
    )
)]
pub async fn authorize(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Query(query): Query<AuthorizeQuery>,
    uri: Uri,
) -> Result<Json<AuthzDecisionDto>, ProblemResponse> {
    let capability =
        parse_field::<Capability>("capability", &query.capability).map_err(problem(&uri))?;
    let decision = svc
        .check_authorization(id, actor, capability)
        .await
        .map_err(problem(&uri))?;
    Ok(Json(AuthzDecisionDto {
        workspace_id: id,
        user_id: actor,
        capability: capability.to_string(),
        allowed: decision.is_allowed(),
    }))
}

#[utoipa::path(
    get, path = "/workspaces/{id}/members", tag = "members",
    params(("id" = Uuid, Path, description = "Workspace id")),
    responses(
        (status = 200, description = "Members by join time", body = [MemberDto]),
        (status = 403, description = "Not a member", body = Problem),
    )
)]
pub async fn list_members(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<Vec<MemberDto>>, ProblemResponse> {
    let members = svc.list_members(actor, id).await.map_err(problem(&uri))?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post, path = "/workspaces/{id}/members", tag = "members",
    params(("id" = Uuid, Path, description = "Workspace id")),
    request_body = AddMemberReq,
    responses(
        (status = 200, description = "Membership (existing memberships are returned unchanged)", body = MembershipDto),
        (status = 403, description = "Missing manage_members", body = Problem),
        (status = 409, description = "Workspace is private", body = Problem),
    )
)]
pub async fn add_member(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<AddMemberReq>,
) -> Result<Json<MembershipDto>, ProblemResponse> {
    let role = match req.role.as_deref() {
        Some(role) => parse_field::<WorkspaceRole>("role", role).map_err(problem(&uri))?,
        None => WorkspaceRole::Member,
    };
    let membership = svc
        .add_member(actor, id, req.user_id, role)
        .await
        .map_err(problem(&uri))?;
    Ok(Json(membership.into()))
}

#[utoipa::path(
    put, path = "/workspaces/{id}/members/{user_id}", tag = "members",
    params(
        ("id" = Uuid, Path, description = "Workspace id"),
        ("user_id" = Uuid, Path, description = "Member user id"),
    ),
    request_body = ChangeMemberRoleReq,
    responses(
        (status = 200, description = "Updated membership", body = MembershipDto),
        (status = 403, description = "Missing manage_members or targeting the owner", body = Problem),
    )
)]
pub async fn change_member_role(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    uri: Uri,
    Json(req): Json<ChangeMemberRoleReq>,
) -> Result<Json<MembershipDto>, ProblemResponse> {
    let role = parse_field::<WorkspaceRole>("role", &req.role).map_err(problem(&uri))?;
    let membership = svc
        .change_member_role(actor, id, user_id, role)
        .await
        .map_err(problem(&uri))?;
    Ok(Json(membership.into()))
}

#[utoipa::path(
    delete, path = "/workspaces/{id}/members/{user_id}", tag = "members",
    params(
        ("id" = Uuid, Path, description = "Workspace id"),
        ("user_id" = Uuid, Path, description = "Member user id; the caller's own id leaves the workspace"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 409, description = "The owner cannot be removed", body = Problem),
    )
)]
pub async fn remove_member(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    svc.remove_member(actor, id, user_id)
        .await
        .map_err(problem(&uri))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/workspaces/{id}/transfer-ownership", tag = "members",
    params(("id" = Uuid, Path, description = "Workspace id")),
    request_body = TransferOwnershipReq,
    responses(
        (status = 200, description = "Workspace with its new owner", body = WorkspaceDto),
        (status = 403, description = "Caller is not the owner", body = Problem),
    )
)]
pub async fn transfer_ownership(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<TransferOwnershipReq>,
) -> Result<Json<WorkspaceDto>, ProblemResponse> {
    info!(workspace_id = %id, new_owner = %req.user_id, "Transferring ownership");
    let ws = svc
        .transfer_ownership(actor, id, req.user_id)
        .await
        .map_err(problem(&uri))?;
    Ok(Json(ws.into()))
}

#[utoipa::path(
    post, path = "/workspaces/{id}/invite-code", tag = "invitations",
    params(("id" = Uuid, Path, description = "Workspace id")),
    responses(
        (status = 200, description = "Workspace with a fresh invite code", body = WorkspaceDto),
        (status = 403, description = "Missing manage_workspace", body = Problem),
    )
)]
pub async fn regenerate_invite_code(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<WorkspaceDto>, ProblemResponse> {
    let ws = svc
        .regenerate_invite_code(actor, id)
        .await
        .map_err(problem(&uri))?;
    Ok(Json(ws.into()))
}

#[utoipa::path(
    get, path = "/workspaces/{id}/invitations", tag = "invitations",
    params(("id" = Uuid, Path, description = "Workspace id")),
    responses(
        (status = 200, description = "Invitations, newest first", body = [InvitationDto]),
        (status = 403, description = "Missing manage_members", body = Problem),
    )
)]
pub async fn list_invitations(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<Vec<InvitationDto>>, ProblemResponse> {
    let invitations = svc.list_invitations(actor, id).await.map_err(problem(&uri))?;
    Ok(Json(invitations.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post, path = "/workspaces/{id}/invitations", tag = "invitations",
    params(("id" = Uuid, Path, description = "Workspace id")),
    request_body = CreateInvitationReq,
    responses(
        (status = 201, description = "Invitation issued; token shown once", body = IssuedInvitationDto),
        (status = 403, description = "Missing manage_members", body = Problem),
        (status = 409, description = "Workspace is private", body = Problem),
    )
)]
pub async fn create_invitation(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<CreateInvitationReq>,
) -> Result<(StatusCode, Json<IssuedInvitationDto>), ProblemResponse> {
    let role = match req.role.as_deref() {
        Some(role) => parse_field::<WorkspaceRole>("role", role).map_err(problem(&uri))?,
        None => WorkspaceRole::Member,
    };
    let invite = NewInvitation {
        email: req.email,
        role,
    };
    let outcome = svc
        .create_invitation(actor, id, invite)
        .await
        .map_err(problem(&uri))?;
    Ok((
        StatusCode::CREATED,
        Json(IssuedInvitationDto::new(outcome.value, outcome.warnings)),
    ))
}

// --- invitation acceptance ---

#[utoipa::path(
    get, path = "/invitations/{token}", tag = "invitations",
    params(("token" = String, Path, description = "Invite token")),
    responses(
        (status = 200, description = "What the invitation grants", body = InvitePreviewDto),
        (status = 404, description = "Unknown token", body = Problem),
    )
)]
pub async fn preview_invitation(
    Extension(svc): Svc,
    Path(token): Path<String>,
) -> Result<Json<InvitePreviewDto>, ProblemResponse> {
    let preview = svc
        .preview_invite(&token)
        .await
        .map_err(|e| map_domain_error(&e, "/invitations"))?;
    Ok(Json(preview.into()))
}

/// Works without a session so the client learns it must sign in first
/// (`401 WA_AUTH_REQUIRED`) and can replay the same token afterwards.
#[utoipa::path(
    post, path = "/invitations/{token}/accept", tag = "invitations",
    params(("token" = String, Path, description = "Invite token")),
    responses(
        (status = 200, description = "Joined, or already a member", body = InviteAcceptanceDto),
        (status = 401, description = "Sign in and replay the token", body = Problem),
        (status = 404, description = "Unknown token", body = Problem),
        (status = 409, description = "Token already used", body = Problem),
        (status = 410, description = "Token expired", body = Problem),
    )
)]
pub async fn accept_invitation(
    Extension(svc): Svc,
    MaybeUser(actor): MaybeUser,
    Path(token): Path<String>,
) -> Result<Json<InviteAcceptanceDto>, ProblemResponse> {
    // The token is a bearer secret; keep it out of the problem instance.
    let acceptance = svc
        .accept_invite(&token, actor)
        .await
        .map_err(|e| map_domain_error(&e, "/invitations/accept"))?;
    info!(workspace_id = %acceptance.workspace.id, "Invitation accepted");
    Ok(Json(acceptance.into()))
}

#[utoipa::path(
    post, path = "/join/{code}", tag = "invitations",
    params(("code" = String, Path, description = "Workspace invite code")),
    responses(
        (status = 200, description = "Joined, or already a member", body = InviteAcceptanceDto),
        (status = 404, description = "Unknown code", body = Problem),
        (status = 409, description = "Workspace is private", body = Problem),
    )
)]
pub async fn join_by_code(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(code): Path<String>,
    uri: Uri,
) -> Result<Json<InviteAcceptanceDto>, ProblemResponse> {
    let joined = svc.join_by_code(actor, &code).await.map_err(problem(&uri))?;
    Ok(Json(joined.into()))
}

// --- notifications ---

#[utoipa::path(
    get, path = "/notifications", tag = "notifications",
    params(ListNotificationsQuery),
    responses((status = 200, description = "Newest first", body = [NotificationDto]))
)]
pub async fn list_notifications(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<ListNotificationsQuery>,
    uri: Uri,
) -> Result<Json<Vec<NotificationDto>>, ProblemResponse> {
    let query = NotificationQuery {
        limit: query.limit,
        unread_only: query.unread_only.unwrap_or(false),
    };
    let items = svc
        .list_notifications(actor, query)
        .await
        .map_err(problem(&uri))?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get, path = "/notifications/unread-count", tag = "notifications",
    responses((status = 200, description = "Badge count", body = UnreadCountDto))
)]
pub async fn unread_count(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    uri: Uri,
) -> Result<Json<UnreadCountDto>, ProblemResponse> {
    let unread = svc.unread_count(actor).await.map_err(problem(&uri))?;
    Ok(Json(UnreadCountDto { unread }))
}

#[utoipa::path(
    post, path = "/notifications/{id}/read", tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked read (idempotent)", body = NotificationDto),
        (status = 403, description = "Not the recipient", body = Problem),
        (status = 404, description = "Unknown notification", body = Problem),
    )
)]
pub async fn mark_read(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<NotificationDto>, ProblemResponse> {
    let n = svc.mark_read(actor, id).await.map_err(problem(&uri))?;
    Ok(Json(n.into()))
}

#[utoipa::path(
    post, path = "/notifications/read-all", tag = "notifications",
    responses((status = 200, description = "Number of notifications marked read", body = BulkResultDto))
)]
pub async fn mark_all_read(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    uri: Uri,
) -> Result<Json<BulkResultDto>, ProblemResponse> {
    let affected = svc.mark_all_read(actor).await.map_err(problem(&uri))?;
    Ok(Json(BulkResultDto { affected }))
}

#[utoipa::path(
    delete, path = "/notifications/{id}", tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Dismissed"),
        (status = 403, description = "Not the recipient", body = Problem),
    )
)]
pub async fn dismiss_notification(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    svc.dismiss(actor, id).await.map_err(problem(&uri))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete, path = "/notifications", tag = "notifications",
    responses((status = 200, description = "Number of notifications removed", body = BulkResultDto))
)]
pub async fn clear_notifications(
    Extension(svc): Svc,
    CurrentUser(actor): CurrentUser,
    uri: Uri,
) -> Result<Json<BulkResultDto>, ProblemResponse> {
    let affected = svc.clear_all(actor).await.map_err(problem(&uri))?;
    Ok(Json(BulkResultDto { affected }))
}
