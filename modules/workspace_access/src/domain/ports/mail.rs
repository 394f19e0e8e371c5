use std::collections::BTreeMap;

use async_trait::async_trait;

/// Templates the mail collaborator knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    /// Initial credentials for a freshly approved access request.
    AccessGranted,
    /// Link carrying an invite token.
    WorkspaceInvitation,
}

impl MailTemplate {
    pub fn as_str(self) -> &'static str {
        match self {
            MailTemplate::AccessGranted => "access_granted",
            MailTemplate::WorkspaceInvitation => "workspace_invitation",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub template: MailTemplate,
    pub to: String,
    pub variables: BTreeMap<String, String>,
}

impl MailMessage {
    pub fn new(template: MailTemplate, to: impl Into<String>) -> Self {
        Self {
            template,
            to: to.into(),
            variables: BTreeMap::new(),
        }
    }

    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.variables.insert(key.to_string(), value.into());
        self
    }
}

// Variables can hold initial passwords and invite tokens.
impl std::fmt::Debug for MailMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailMessage")
            .field("template", &self.template)
            .field("to", &self.to)
            .field("variables", &self.variables.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Outbound mail collaborator. Delivery is best effort: callers never roll
/// back state because a send failed.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()>;
}
