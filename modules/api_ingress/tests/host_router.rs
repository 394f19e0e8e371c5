//! Host routes, body limits and the serve loop.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::post,
    Router,
};
use tower::util::ServiceExt;
use utoipa::OpenApi;

use api_ingress::{ApiIngress, ApiIngressConfig};

#[derive(OpenApi)]
#[openapi(paths(echo))]
struct EchoDoc;

/// Echo the body back.
#[utoipa::path(post, path = "/echo", responses((status = 200, description = "Echoed")))]
async fn echo(body: String) -> String {
    body
}

fn ingress(config: ApiIngressConfig) -> ApiIngress {
    let mut ingress = ApiIngress::new(config);
    ingress.register_openapi(EchoDoc::openapi());
    ingress
}

fn app(config: ApiIngressConfig) -> Router {
    ingress(config)
        .build_router(Router::new().route("/echo", post(echo)))
        .unwrap()
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_healthy() {
    let (status, json) = get_json(app(ApiIngressConfig::default()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn openapi_document_contains_module_paths() {
    let (status, json) = get_json(app(ApiIngressConfig::default()), "/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["info"]["title"], "Workhub API");
    assert!(json["paths"]["/echo"]["post"].is_object());
}

#[tokio::test]
async fn docs_page_follows_config() {
    let enabled = app(ApiIngressConfig::default())
        .oneshot(Request::builder().uri("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(enabled.status(), StatusCode::OK);

    let disabled = app(ApiIngressConfig {
        enable_docs: false,
        ..ApiIngressConfig::default()
    })
    .oneshot(Request::builder().uri("/docs").body(Body::empty()).unwrap())
    .await
    .unwrap();
    assert_eq!(disabled.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = app(ApiIngressConfig {
        body_limit_bytes: 8,
        ..ApiIngressConfig::default()
    });

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("content-length", "32")
                .body(Body::from("x".repeat(32)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn invalid_bind_address_is_an_error() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ingress = ingress(ApiIngressConfig {
        bind_addr: "not-an-address".into(),
        ..ApiIngressConfig::default()
    });

    let err = rt.block_on(ingress.bind()).unwrap_err();
    assert!(err.to_string().contains("Invalid bind address"));
}

#[tokio::test]
async fn serves_until_shutdown() {
    let ingress = ingress(ApiIngressConfig {
        bind_addr: "127.0.0.1:0".into(),
        ..ApiIngressConfig::default()
    });
    let listener = ingress.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = ingress.build_router(Router::new()).unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(ApiIngress::serve(listener, router, async {
        let _ = rx.await;
    }));

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
