#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use workspace_access::contract::model::{
    MemberProfile, Membership, NewUser, User, Workspace, WorkspaceRole,
};
use workspace_access::domain::events::AccessDomainEvent;
use workspace_access::domain::ports::{EventPublisher, MailMessage, MailSender};
use workspace_access::domain::repo::{Repositories, WorkspacesRepository};
use workspace_access::domain::service::{Service, ServiceConfig};
use workspace_access::infra::storage::{migrations::Migrator, SeaOrmRepository};

/// Fresh in-memory SQLite with migrations applied.
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Records every message handed to it; optionally fails every send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message);
        if self.fail {
            anyhow::bail!("relay unreachable");
        }
        Ok(())
    }
}

/// Keeps published events for assertions.
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<AccessDomainEvent>>,
}

impl RecordingEvents {
    pub fn events(&self) -> Vec<AccessDomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventPublisher<AccessDomainEvent> for RecordingEvents {
    fn publish(&self, event: &AccessDomainEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct Harness {
    pub service: Arc<Service>,
    pub mailer: Arc<RecordingMailer>,
    pub events: Arc<RecordingEvents>,
}

pub async fn harness() -> Harness {
    harness_with(ServiceConfig::default(), RecordingMailer::default()).await
}

pub async fn harness_with(config: ServiceConfig, mailer: RecordingMailer) -> Harness {
    let db = create_test_db().await;
    let repos = Repositories::from_shared(Arc::new(SeaOrmRepository::new(db)));
    let mailer = Arc::new(mailer);
    let events = Arc::new(RecordingEvents::default());
    let service = Arc::new(Service::new(repos, mailer.clone(), events.clone(), config));
    Harness {
        service,
        mailer,
        events,
    }
}

/// Workspace storage whose inserts fail; everything else reaches SQLite.
pub struct UnwritableWorkspaces {
    inner: Arc<SeaOrmRepository>,
}

#[async_trait]
impl WorkspacesRepository for UnwritableWorkspaces {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Workspace>> {
        WorkspacesRepository::find_by_id(&*self.inner, id).await
    }
    async fn find_by_invite_code(&self, code: &str) -> Result<Option<Workspace>> {
        self.inner.find_by_invite_code(code).await
    }
    async fn insert_with_owner(&self, _workspace: Workspace) -> Result<Membership> {
        anyhow::bail!("disk full")
    }
    async fn update(&self, workspace: Workspace) -> Result<()> {
        self.inner.update(workspace).await
    }
    async fn delete_cascade(&self, id: Uuid) -> Result<bool> {
        WorkspacesRepository::delete_cascade(&*self.inner, id).await
    }
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<(Workspace, Membership)>> {
        self.inner.list_for_user(user_id).await
    }
    async fn find_membership(&self, workspace_id: Uuid, user_id: Uuid) -> Result<Option<Membership>> {
        self.inner.find_membership(workspace_id, user_id).await
    }
    async fn insert_membership_if_absent(&self, membership: Membership) -> Result<(Membership, bool)> {
        self.inner.insert_membership_if_absent(membership).await
    }
    async fn list_members(&self, workspace_id: Uuid) -> Result<Vec<MemberProfile>> {
        self.inner.list_members(workspace_id).await
    }
    async fn update_membership_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<bool> {
        self.inner.update_membership_role(workspace_id, user_id, role).await
    }
    async fn delete_membership(&self, workspace_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.inner.delete_membership(workspace_id, user_id).await
    }
    async fn transfer_ownership(&self, workspace_id: Uuid, from: Uuid, to: Uuid) -> Result<()> {
        self.inner.transfer_ownership(workspace_id, from, to).await
    }
}

/// Harness whose personal-workspace provisioning always fails.
pub async fn harness_with_unwritable_workspaces() -> Harness {
    let db = create_test_db().await;
    let store = Arc::new(SeaOrmRepository::new(db));
    let repos = Repositories {
        workspaces: Arc::new(UnwritableWorkspaces {
            inner: store.clone(),
        }),
        ..Repositories::from_shared(store)
    };
    let mailer = Arc::new(RecordingMailer::default());
    let events = Arc::new(RecordingEvents::default());
    let service = Arc::new(Service::new(
        repos,
        mailer.clone(),
        events.clone(),
        ServiceConfig::default(),
    ));
    Harness {
        service,
        mailer,
        events,
    }
}

/// The first registration bootstraps the platform owner.
pub async fn platform_owner(svc: &Service) -> User {
    svc.register(NewUser {
        name: "Olga".into(),
        email: "olga@example.com".into(),
        password: "correct horse".into(),
    })
    .await
    .expect("bootstrap owner")
}

/// Register a second account and approve it as `approver`.
pub async fn approved_user(svc: &Service, approver: Uuid, name: &str) -> User {
    let user = pending_user(svc, name).await;
    svc.approve_user(approver, user.id)
        .await
        .expect("approve user")
}

pub async fn pending_user(svc: &Service, name: &str) -> User {
    svc.register(NewUser {
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: "hunter2hunter2".into(),
    })
    .await
    .expect("register user")
}
