use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{MailMessage, MailSender};

/// Mail sender for development setups without a relay.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        info!(
            template = message.template.as_str(),
            to = %message.to,
            variables = ?message.variables.keys().collect::<Vec<_>>(),
            "mail not sent: no relay configured"
        );
        Ok(())
    }
}
