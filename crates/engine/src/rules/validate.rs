use super::rule::{ChannelAction, ConditionClause, ConditionOperator};

/// Rejected rule definitions never reach the engine; this is the single
/// validation point shared by the REST create/update handlers.
#[derive(Debug)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_rule(
    name: &str,
    conditions: &[ConditionClause],
    actions: &[ChannelAction],
    cooldown_minutes: i64,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "must not be empty"));
    }
    if conditions.is_empty() {
        return Err(ValidationError::new(
            "conditions",
            "at least one condition clause is required",
        ));
    }
    if actions.is_empty() {
        return Err(ValidationError::new(
            "actions",
            "at least one channel action is required",
        ));
    }
    if cooldown_minutes < 0 {
        return Err(ValidationError::new("cooldown_minutes", "must be >= 0"));
    }
    for clause in conditions {
        validate_clause(clause)?;
    }
    for action in actions {
        validate_action(action)?;
    }
    Ok(())
}

fn validate_clause(clause: &ConditionClause) -> Result<(), ValidationError> {
    match clause.operator {
        ConditionOperator::In => {
            if !clause.value.is_array() {
                return Err(ValidationError::new(
                    "conditions",
                    "'in' requires an array value",
                ));
            }
        }
        ConditionOperator::Gte | ConditionOperator::Lte => {
            let numeric = clause.value.is_number()
                || clause
                    .value
                    .as_str()
                    .is_some_and(|s| s.parse::<f64>().is_ok());
            if !numeric {
                return Err(ValidationError::new(
                    "conditions",
                    "'gte'/'lte' require a numeric value",
                ));
            }
        }
        ConditionOperator::Contains => {
            if !clause.value.is_string() {
                return Err(ValidationError::new(
                    "conditions",
                    "'contains' requires a string value",
                ));
            }
        }
        ConditionOperator::Equals => {
            if clause.value.is_array() || clause.value.is_object() {
                return Err(ValidationError::new(
                    "conditions",
                    "'equals' requires a scalar value",
                ));
            }
        }
    }
    Ok(())
}

pub fn validate_action(action: &ChannelAction) -> Result<(), ValidationError> {
    match action {
        ChannelAction::InApp(_) => Ok(()),
        ChannelAction::Email(cfg) => {
            if let Some(to) = &cfg.to {
                if !to.contains('@') {
                    return Err(ValidationError::new(
                        "actions",
                        "email 'to' must be an address",
                    ));
                }
            }
            Ok(())
        }
        ChannelAction::Slack(cfg) => {
            if !cfg.webhook_url.contains("hooks.slack.com") {
                return Err(ValidationError::new(
                    "actions",
                    "slack webhook_url must contain hooks.slack.com",
                ));
            }
            Ok(())
        }
        ChannelAction::Discord(cfg) => {
            if !cfg.webhook_url.contains("discord.com/api/webhooks") {
                return Err(ValidationError::new(
                    "actions",
                    "discord webhook_url must contain discord.com/api/webhooks",
                ));
            }
            Ok(())
        }
        ChannelAction::Webhook(cfg) => {
            if !cfg.url.starts_with("http://") && !cfg.url.starts_with("https://") {
                return Err(ValidationError::new(
                    "actions",
                    "webhook url must start with http:// or https://",
                ));
            }
            if let Some(method) = &cfg.method {
                let ok = matches!(
                    method.to_ascii_uppercase().as_str(),
                    "POST" | "PUT" | "PATCH"
                );
                if !ok {
                    return Err(ValidationError::new(
                        "actions",
                        format!("unsupported webhook method '{method}'"),
                    ));
                }
            }
            Ok(())
        }
    }
}
