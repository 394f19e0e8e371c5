use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::api::rest::{routes, WorkspaceAccessDoc};
use crate::config::WorkspaceAccessConfig;
use crate::contract::client::WorkspaceAccessApi;
use crate::domain::repo::Repositories;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::WorkspaceAccessLocalClient;
use crate::infra::events::TracingEventPublisher;
use crate::infra::mail::build_mail_sender;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::SeaOrmRepository;

/// Wiring for the workspace access module: storage, mail, REST and the
/// in-process client all share one [`Service`].
#[derive(Clone)]
pub struct WorkspaceAccess {
    service: Arc<Service>,
}

impl WorkspaceAccess {
    /// Build the module on top of an already migrated database.
    pub fn init(cfg: &WorkspaceAccessConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        info!("Initializing workspace_access module");
        debug!(
            "Loaded workspace_access config: invite_ttl_hours={}, default_page_size={}, max_page_size={}, mail_relay={}",
            cfg.invite_ttl_hours,
            cfg.default_page_size,
            cfg.max_page_size,
            cfg.mail.relay_url.is_some()
        );

        let repos = Repositories::from_shared(Arc::new(SeaOrmRepository::new(db)));
        let mailer = build_mail_sender(&cfg.mail)?;
        let service = Service::new(
            repos,
            mailer,
            Arc::new(TracingEventPublisher),
            ServiceConfig::from(cfg),
        );
        Ok(Self::from_service(Arc::new(service)))
    }

    pub fn from_service(service: Arc<Service>) -> Self {
        Self { service }
    }

    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running workspace_access database migrations");
        Migrator::up(db, None).await?;
        info!("workspace_access migrations completed");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn WorkspaceAccessApi> {
        Arc::new(WorkspaceAccessLocalClient::new(self.service.clone()))
    }

    pub fn register_rest(&self, router: Router) -> Router {
        info!("Registering workspace_access REST routes");
        routes::register_routes(router, self.service.clone())
    }

    pub fn openapi() -> utoipa::openapi::OpenApi {
        WorkspaceAccessDoc::openapi()
    }
}
