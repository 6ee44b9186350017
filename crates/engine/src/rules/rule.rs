use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A user-defined alert rule: an AND-ed set of condition clauses plus the
/// channels a matched vulnerability is delivered to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub conditions: Vec<ConditionClause>,
    pub actions: Vec<ChannelAction>,
    #[serde(default)]
    pub cooldown_minutes: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub trigger_count: u64,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionClause {
    pub field: ConditionField,
    pub operator: ConditionOperator,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConditionField {
    Severity,
    CvssScore,
    AffectedSoftware,
    Category,
    ExploitAvailable,
    PatchAvailable,
    Kev,
    Trending,
    Tags,
    CweId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOperator {
    Equals,
    In,
    Gte,
    Lte,
    Contains,
}

/// Channel specification carried by a rule. The tag/content split keeps the
/// wire shape at `{channel, config}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "channel", content = "config", rename_all = "lowercase")]
pub enum ChannelAction {
    #[serde(rename = "in-app")]
    InApp(InAppConfig),
    Email(EmailConfig),
    Slack(SlackConfig),
    Discord(DiscordConfig),
    Webhook(WebhookConfig),
}

impl ChannelAction {
    pub fn kind(&self) -> ChannelKind {
        match self {
            Self::InApp(_) => ChannelKind::InApp,
            Self::Email(_) => ChannelKind::Email,
            Self::Slack(_) => ChannelKind::Slack,
            Self::Discord(_) => ChannelKind::Discord,
            Self::Webhook(_) => ChannelKind::Webhook,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[serde(rename = "in-app")]
    InApp,
    Email,
    Slack,
    Discord,
    Webhook,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "in-app",
            Self::Email => "email",
            Self::Slack => "slack",
            Self::Discord => "discord",
            Self::Webhook => "webhook",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InAppConfig {}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmailConfig {
    /// Overrides the owner directory's address when set.
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub subject_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlackConfig {
    pub webhook_url: String,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub secret: Option<String>,
}
