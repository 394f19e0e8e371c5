use serde::{Deserialize, Serialize};

/// Configuration for the workspace_access module (`modules.workspace_access`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceAccessConfig {
    #[serde(default = "default_invite_ttl_hours")]
    pub invite_ttl_hours: u32,
    #[serde(default = "default_invite_code_length")]
    pub invite_code_length: usize,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    #[serde(default = "default_initial_password_length")]
    pub initial_password_length: usize,
    #[serde(default = "default_true")]
    pub provision_personal_workspace: bool,
    #[serde(default = "default_true")]
    pub enforce_invite_email: bool,
    /// Origin used to build links placed in mails and notifications.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// HTTP mail relay endpoint; when absent mails are only logged.
    #[serde(default)]
    pub relay_url: Option<String>,
    #[serde(default = "default_mail_from")]
    pub from: String,
    #[serde(default = "default_mail_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for WorkspaceAccessConfig {
    fn default() -> Self {
        Self {
            invite_ttl_hours: default_invite_ttl_hours(),
            invite_code_length: default_invite_code_length(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            initial_password_length: default_initial_password_length(),
            provision_personal_workspace: true,
            enforce_invite_email: true,
            public_base_url: default_public_base_url(),
            mail: MailConfig::default(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            from: default_mail_from(),
            timeout_ms: default_mail_timeout_ms(),
        }
    }
}

fn default_invite_ttl_hours() -> u32 {
    7 * 24
}

fn default_invite_code_length() -> usize {
    10
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

fn default_initial_password_length() -> usize {
    16
}

fn default_true() -> bool {
    true
}

fn default_public_base_url() -> String {
    "http://localhost:8087".to_string()
}

fn default_mail_from() -> String {
    "no-reply@workhub.local".to_string()
}

fn default_mail_timeout_ms() -> u64 {
    5_000
}
