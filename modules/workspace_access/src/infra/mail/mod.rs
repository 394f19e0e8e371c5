mod http;
mod log_sender;

pub use http::HttpMailSender;
pub use log_sender::LogMailSender;

use std::sync::Arc;

use crate::config::MailConfig;
use crate::domain::ports::MailSender;

/// Relay-backed sender when a relay URL is configured, log-only otherwise.
pub fn build_mail_sender(cfg: &MailConfig) -> anyhow::Result<Arc<dyn MailSender>> {
    match cfg.relay_url.as_deref() {
        Some(url) => Ok(Arc::new(HttpMailSender::from_config(url, cfg)?)),
        None => Ok(Arc::new(LogMailSender)),
    }
}
