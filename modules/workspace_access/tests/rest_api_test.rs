//! REST layer tests: the real routes on an in-memory database, driven with
//! `tower::ServiceExt::oneshot`.

mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::{approved_user, harness, platform_owner, Harness};
use workspace_access::api::rest::auth::USER_ID_HEADER;
use workspace_access::api::rest::routes::register_routes;
use workspace_access::module::WorkspaceAccess;

fn router(h: &Harness) -> Router {
    register_routes(Router::new(), h.service.clone())
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

#[tokio::test]
async fn register_and_login_round() -> Result<()> {
    let h = harness().await;
    let app = router(&h);

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"name": "Olga", "email": "olga@example.com", "password": "correct horse"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["platform_role"], "owner");
    assert_eq!(body["auth"], "password");
    assert!(body.get("password_hash").is_none());

    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"name": "Bob", "email": "bob@example.com", "password": "hunter2hunter2"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "bob@example.com", "password": "hunter2hunter2"})),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "WA_PENDING_APPROVAL");

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "olga@example.com", "password": "nope"})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "WA_INVALID_CREDENTIALS");
    Ok(())
}

#[tokio::test]
async fn missing_or_malformed_session_is_unauthorized() -> Result<()> {
    let h = harness().await;
    let app = router(&h);

    let (status, body) = call(&app, Method::GET, "/workspaces", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "WA_AUTH_REQUIRED");
    assert_eq!(body["instance"], "/workspaces");

    let request = Request::builder()
        .uri("/notifications")
        .header(USER_ID_HEADER, "not-a-uuid")
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn access_request_review_over_http() -> Result<()> {
    let h = harness().await;
    let owner = platform_owner(&h.service).await;
    let app = router(&h);

    let (status, body) = call(
        &app,
        Method::POST,
        "/access-requests",
        None,
        Some(json!({"name": "Ana", "email": "ana@x.com"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::GET,
        "/access-requests?status=pending",
        Some(owner.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        Method::GET,
        "/access-requests?status=waiting",
        Some(owner.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["extensions"]["field"], "status");

    let uri = format!("/access-requests/{id}/approve");
    let (status, body) = call(&app, Method::POST, &uri, Some(owner.id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "approved");
    assert_eq!(body["user"]["is_approved"], true);
    assert_eq!(body["warnings"], json!([]));

    let (status, body) = call(&app, Method::POST, &uri, Some(owner.id), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "WA_INVALID_STATE");
    assert_eq!(h.mailer.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn workspace_lifecycle_and_members() -> Result<()> {
    let h = harness().await;
    let owner = platform_owner(&h.service).await;
    let bob = approved_user(&h.service, owner.id, "Bob").await;
    let app = router(&h);

    let (status, ws) = call(
        &app,
        Method::POST,
        "/workspaces",
        Some(owner.id),
        Some(json!({"name": "Design", "description": "Brand work"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ws["is_private"], false);
    let ws_id = ws["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/workspaces/{ws_id}"),
        Some(bob.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, membership) = call(
        &app,
        Method::POST,
        &format!("/workspaces/{ws_id}/members"),
        Some(owner.id),
        Some(json!({"user_id": bob.id, "role": "admin"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(membership["role"], "admin");

    let (status, decision) = call(
        &app,
        Method::GET,
        &format!("/workspaces/{ws_id}/authorize?capability=delete_workspace"),
        Some(bob.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decision["allowed"], false);

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/workspaces/{ws_id}"),
        Some(bob.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "WA_FORBIDDEN");

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/workspaces/{ws_id}/members/{}", owner.id),
        Some(bob.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "WA_CANNOT_REMOVE_OWNER");

    let (status, members) = call(
        &app,
        Method::GET,
        &format!("/workspaces/{ws_id}/members"),
        Some(bob.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 2);

    let (status, updated) = call(
        &app,
        Method::PATCH,
        &format!("/workspaces/{ws_id}"),
        Some(bob.id),
        Some(json!({"name": "Design Team"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Design Team");

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/workspaces/{ws_id}"),
        Some(owner.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn invitation_accept_flow_over_http() -> Result<()> {
    let h = harness().await;
    let owner = platform_owner(&h.service).await;
    let bob = approved_user(&h.service, owner.id, "Bob").await;
    let app = router(&h);

    let (_, ws) = call(
        &app,
        Method::POST,
        "/workspaces",
        Some(owner.id),
        Some(json!({"name": "Design"})),
    )
    .await?;
    let ws_id = ws["id"].as_str().unwrap().to_string();

    let (status, issued) = call(
        &app,
        Method::POST,
        &format!("/workspaces/{ws_id}/invitations"),
        Some(owner.id),
        Some(json!({"email": "bob@example.com"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(issued["invitation"]["role"], "member");
    let token = issued["token"].as_str().unwrap().to_string();

    let (status, preview) = call(
        &app,
        Method::GET,
        &format!("/invitations/{token}"),
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["workspace_name"], "Design");
    assert_eq!(preview["status"], "pending");

    let accept = format!("/invitations/{token}/accept");
    let (status, body) = call(&app, Method::POST, &accept, None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "WA_AUTH_REQUIRED");
    assert!(!body["instance"].as_str().unwrap().contains(&token));

    let (status, body) = call(&app, Method::POST, &accept, Some(bob.id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "joined");
    assert_eq!(body["membership"]["user_id"], json!(bob.id));

    let (status, body) = call(&app, Method::POST, &accept, Some(bob.id), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "WA_INVITE_CONSUMED");
    assert_eq!(body["extensions"]["workspace_id"], json!(ws_id));

    let (status, _) = call(
        &app,
        Method::GET,
        "/invitations/unknown-token",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn join_by_code_over_http() -> Result<()> {
    let h = harness().await;
    let owner = platform_owner(&h.service).await;
    let bob = approved_user(&h.service, owner.id, "Bob").await;
    let app = router(&h);

    let (_, list) = call(&app, Method::GET, "/workspaces", Some(owner.id), None).await?;
    let personal_code = list[0]["workspace"]["invite_code"]
        .as_str()
        .unwrap()
        .to_string();
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/join/{personal_code}"),
        Some(bob.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "WA_WORKSPACE_PRIVATE");

    let (_, ws) = call(
        &app,
        Method::POST,
        "/workspaces",
        Some(owner.id),
        Some(json!({"name": "Open"})),
    )
    .await?;
    let code = ws["invite_code"].as_str().unwrap();
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/join/{code}"),
        Some(bob.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "joined");

    let (status, body) = call(&app, Method::POST, "/join/ZZZZZZZZ", Some(bob.id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "WA_INVALID_CODE");
    Ok(())
}

#[tokio::test]
async fn notification_center_over_http() -> Result<()> {
    let h = harness().await;
    let owner = platform_owner(&h.service).await;
    let bob = approved_user(&h.service, owner.id, "Bob").await;
    let app = router(&h);

    let (_, ws) = call(
        &app,
        Method::POST,
        "/workspaces",
        Some(owner.id),
        Some(json!({"name": "Design"})),
    )
    .await?;
    let code = ws["invite_code"].as_str().unwrap();
    call(&app, Method::POST, &format!("/join/{code}"), Some(bob.id), None).await?;

    let (status, count) = call(
        &app,
        Method::GET,
        "/notifications/unread-count",
        Some(owner.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["unread"], 1);

    let (_, items) = call(
        &app,
        Method::GET,
        "/notifications?unread_only=true&limit=5",
        Some(owner.id),
        None,
    )
    .await?;
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "member_joined");
    let id = items[0]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/notifications/{id}/read"),
        Some(bob.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "WA_FORBIDDEN");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/notifications/{id}/read"),
        Some(owner.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_read"], true);

    let (status, body) = call(
        &app,
        Method::DELETE,
        "/notifications",
        Some(owner.id),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["affected"], 1);

    let (_, items) = call(&app, Method::GET, "/notifications", Some(owner.id), None).await?;
    assert!(items.as_array().unwrap().is_empty());
    Ok(())
}

#[test]
fn openapi_document_lists_routes() {
    let doc = WorkspaceAccess::openapi();
    let paths = &doc.paths.paths;
    assert!(paths.contains_key("/invitations/{token}/accept"));
    assert!(paths.contains_key("/workspaces/{id}/members/{user_id}"));
    assert!(paths.contains_key("/notifications/unread-count"));
}
