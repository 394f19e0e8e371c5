use tracing::info;

use crate::domain::events::AccessDomainEvent;
use crate::domain::ports::EventPublisher;

/// Publishes domain events as structured log records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

impl EventPublisher<AccessDomainEvent> for TracingEventPublisher {
    fn publish(&self, event: &AccessDomainEvent) {
        info!(target: "workspace_access::events", ?event, "domain event");
    }
}
