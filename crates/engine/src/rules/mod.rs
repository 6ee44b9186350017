mod conditions;
mod rule;
mod store;
mod validate;

pub use conditions::{evaluate, ConditionMatch};
pub use rule::{
    AlertRule, ChannelAction, ChannelKind, ConditionClause, ConditionField, ConditionOperator,
    DiscordConfig, EmailConfig, InAppConfig, SlackConfig, WebhookConfig,
};
pub use store::RuleStore;
pub use validate::{validate_action, validate_rule, ValidationError};
