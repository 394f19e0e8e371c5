pub mod mail;

pub use mail::{MailMessage, MailSender, MailTemplate};

/// Output port: publish domain events (no knowledge of transport).
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}
