//! HTTP host of the server: wraps module routers in the shared middleware
//! stack, serves `/health` and the merged OpenAPI document, and runs the
//! listener until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{middleware::from_fn, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::openapi::{Info, OpenApi, OpenApiBuilder};

mod config;
pub mod error;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

/// Owns the HTTP surface: collects module OpenAPI documents and turns the
/// module routers into one served application.
pub struct ApiIngress {
    config: ApiIngressConfig,
    openapi: OpenApi,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        let openapi = OpenApiBuilder::new()
            .info(Info::new("Workhub API", env!("CARGO_PKG_VERSION")))
            .build();
        Self { config, openapi }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Fold one module's document into the served one. Paths and schemas are
    /// merged; the `info` block stays the host's.
    pub fn register_openapi(&mut self, doc: OpenApi) {
        self.openapi.merge(doc);
    }

    pub fn openapi(&self) -> &OpenApi {
        &self.openapi
    }

    /// Add host routes to `api` and wrap everything in the middleware stack.
    ///
    /// Layers are added innermost first, so a request passes through:
    /// SetRequestId -> PropagateRequestId -> Trace -> request id to extensions
    /// -> Timeout -> CORS -> BodyLimit -> handler.
    pub fn build_router(&self, api: Router) -> Result<Router> {
        let doc = Arc::new(
            serde_json::to_value(&self.openapi).context("Failed to render OpenAPI document")?,
        );
        tracing::info!(
            paths = self.openapi.paths.paths.len(),
            "Serving OpenAPI document"
        );

        let mut router = api
            .route("/health", get(web::health_check))
            .route(
                "/openapi.json",
                get(move || {
                    let doc = doc.clone();
                    async move {
                        ([(header::CACHE_CONTROL, "no-store")], axum::Json((*doc).clone()))
                            .into_response()
                    }
                }),
            )
            .fallback(error::route_not_found);

        if self.config.enable_docs {
            router = router.route("/docs", get(web::serve_docs));
        }

        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        if let Some(timeout) = self.config.timeout() {
            router = router.layer(TimeoutLayer::new(timeout));
        }

        let x_request_id = request_id::header();
        router = router
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = self
            .config
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.config.bind_addr))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Cannot bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", addr);
        Ok(listener)
    }

    /// Serve until `shutdown` resolves; in-flight requests are drained first.
    pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("HTTP server shutting down gracefully");
            })
            .await
            .context("HTTP server failed")
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
