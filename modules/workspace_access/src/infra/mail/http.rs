use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::config::MailConfig;
use crate::domain::ports::{MailMessage, MailSender};

/// Posts every message as JSON to an HTTP mail relay.
pub struct HttpMailSender {
    client: reqwest::Client,
    endpoint: Url,
    from: String,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    template: &'a str,
    from: &'a str,
    to: &'a str,
    variables: &'a BTreeMap<String, String>,
}

impl HttpMailSender {
    pub fn new(client: reqwest::Client, endpoint: Url, from: impl Into<String>) -> Self {
        Self {
            client,
            endpoint,
            from: from.into(),
        }
    }

    pub fn from_config(relay_url: &str, cfg: &MailConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(relay_url)
            .with_context(|| format!("invalid mail relay url '{relay_url}'"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .context("failed to build mail relay client")?;
        Ok(Self::new(client, endpoint, cfg.from.clone()))
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    #[instrument(
        name = "workspace_access.http.mail.send",
        skip_all,
        fields(endpoint = %self.endpoint, template = message.template.as_str())
    )]
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        let payload = RelayPayload {
            template: message.template.as_str(),
            from: &self.from,
            to: &message.to,
            variables: &message.variables,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            bail!("mail relay answered HTTP {status}");
        }
        debug!(%status, "mail relay accepted message");
        Ok(())
    }
}
