use std::sync::Arc;
use std::time::Instant;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use vulnwatch_common::retry::RetryPolicy;

use crate::directory::OwnerDirectory;
use crate::rules::{ChannelAction, ChannelKind, EmailConfig};

use super::channel::ChannelDispatcher;
use super::result::{ChannelResult, DispatchIntent};

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug)]
pub struct MailError(pub String);

impl std::fmt::Display for MailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mail: {}", self.0)
    }
}

impl std::error::Error for MailError {}

/// Delivery seam between the email channel and an actual SMTP provider.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    fn provider(&self) -> &str;
    async fn deliver(&self, message: &EmailMessage) -> Result<(), MailError>;
}

pub struct SmtpMailTransport {
    provider: String,
    from: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(
        provider: &str,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        from: String,
    ) -> Result<Self, MailError> {
        let creds = Credentials::new(username.to_string(), password.to_string());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError(e.to_string()))?
            .port(port)
            .credentials(creds)
            .build();
        Ok(Self {
            provider: provider.to_string(),
            from,
            transport,
        })
    }
}

#[async_trait::async_trait]
impl MailTransport for SmtpMailTransport {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e: lettre::address::AddressError| MailError(e.to_string()))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|e: lettre::address::AddressError| MailError(e.to_string()))?)
            .subject(&message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| MailError(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError(e.to_string()))?;
        Ok(())
    }
}

/// Email channel: primary provider with bounded retry/backoff, then an
/// optional secondary provider with the same budget. The reported `provider`
/// is the one that succeeded, or the last one attempted on total failure.
pub struct EmailDispatcher {
    primary: Arc<dyn MailTransport>,
    secondary: Option<Arc<dyn MailTransport>>,
    directory: Arc<dyn OwnerDirectory>,
    retry: RetryPolicy,
}

impl EmailDispatcher {
    pub fn new(primary: Arc<dyn MailTransport>, directory: Arc<dyn OwnerDirectory>) -> Self {
        Self {
            primary,
            secondary: None,
            directory,
            retry: RetryPolicy::default().with_max_attempts(2),
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn MailTransport>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn resolve_recipient(&self, intent: &DispatchIntent, cfg: &EmailConfig) -> Option<String> {
        match &cfg.to {
            Some(to) => Some(to.clone()),
            None => self.directory.email_address(&intent.owner_id).await,
        }
    }

    fn build_message(intent: &DispatchIntent, cfg: &EmailConfig, to: String) -> EmailMessage {
        let vuln = &intent.vulnerability;
        let prefix = cfg.subject_prefix.as_deref().unwrap_or("[Vulnwatch]");
        let subject = format!(
            "{} [{}] {} - {}",
            prefix,
            vuln.severity.label(),
            vuln.cve_id,
            intent.rule_name
        );
        let body = format!(
            "Rule: {}\nCVE: {}\nTitle: {}\nSeverity: {}\nCVSS: {}\nAffected: {}\nExploit available: {}\nPatch available: {}",
            intent.rule_name,
            vuln.cve_id,
            vuln.title,
            vuln.severity.as_str(),
            vuln.cvss_score.map_or("n/a".into(), |s| format!("{s:.1}")),
            vuln.affected_software.join(", "),
            vuln.exploit_available,
            vuln.patch_available,
        );
        EmailMessage { to, subject, body }
    }
}

#[async_trait::async_trait]
impl ChannelDispatcher for EmailDispatcher {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, intent: &DispatchIntent, action: &ChannelAction) -> ChannelResult {
        let start = Instant::now();
        let ChannelAction::Email(cfg) = action else {
            return ChannelResult::failed(
                ChannelKind::Email,
                "none",
                0,
                0,
                "mismatched channel config",
            );
        };

        // No resolvable address is a structural skip, not a delivery failure.
        let Some(to) = self.resolve_recipient(intent, cfg).await else {
            tracing::warn!(
                rule_id = %intent.rule_id,
                owner_id = %intent.owner_id,
                "no email address for owner, skipping email channel"
            );
            return ChannelResult::skipped(ChannelKind::Email);
        };

        let message = Self::build_message(intent, cfg, to);

        let mut providers: Vec<&Arc<dyn MailTransport>> = vec![&self.primary];
        if let Some(secondary) = &self.secondary {
            providers.push(secondary);
        }

        let mut attempts: u32 = 0;
        let mut last_error = String::new();
        let mut last_provider = self.primary.provider().to_string();

        for transport in providers {
            last_provider = transport.provider().to_string();
            let mut provider_attempt: u32 = 0;
            loop {
                attempts += 1;
                match transport.deliver(&message).await {
                    Ok(()) => {
                        return ChannelResult::ok(
                            ChannelKind::Email,
                            transport.provider(),
                            attempts - 1,
                            start.elapsed().as_millis() as u64,
                        );
                    }
                    Err(e) => {
                        last_error = e.to_string();
                        tracing::warn!(
                            provider = transport.provider(),
                            attempt = provider_attempt,
                            error = %last_error,
                            "email delivery attempt failed"
                        );
                        if !self.retry.should_retry(provider_attempt) {
                            break;
                        }
                        tokio::time::sleep(self.retry.delay_for_attempt(provider_attempt)).await;
                        provider_attempt += 1;
                    }
                }
            }
        }

        ChannelResult::failed(
            ChannelKind::Email,
            &last_provider,
            attempts - 1,
            start.elapsed().as_millis() as u64,
            last_error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use vulnwatch_common::vuln::{Severity, Vulnerability};

    struct FailingTransport {
        name: String,
        attempts: AtomicU32,
        max_failures: u32,
    }

    impl FailingTransport {
        fn new(name: &str, max_failures: u32) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                attempts: AtomicU32::new(0),
                max_failures,
            })
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl MailTransport for FailingTransport {
        fn provider(&self) -> &str {
            &self.name
        }

        async fn deliver(&self, _message: &EmailMessage) -> Result<(), MailError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.max_failures {
                Err(MailError(format!("fail #{}", n + 1)))
            } else {
                Ok(())
            }
        }
    }

    fn sample_intent() -> DispatchIntent {
        DispatchIntent {
            dispatch_id: "d-1".into(),
            rule_id: "r-1".into(),
            rule_name: "critical vulns".into(),
            owner_id: "u-1".into(),
            vulnerability: Vulnerability {
                id: "v-1".into(),
                cve_id: "CVE-2024-0001".into(),
                title: "Heap overflow".into(),
                severity: Severity::Critical,
                cvss_score: Some(9.8),
                affected_software: vec!["libexample".into()],
                category: None,
                exploit_available: true,
                patch_available: false,
                kev: false,
                trending: false,
                tags: vec![],
                cwe_id: None,
                observed_at_ms: 1000,
            },
            matched_conditions: vec![],
            generated_at_ms: 1000,
        }
    }

    fn email_action() -> ChannelAction {
        serde_json::from_value(json!({"channel": "email", "config": {}})).unwrap()
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            jitter_factor: 0.0,
        }
    }

    fn directory() -> Arc<StaticDirectory> {
        Arc::new(StaticDirectory::new().with_address("u-1", "owner@example.com"))
    }

    #[tokio::test]
    async fn succeeds_on_primary_first_try() {
        let primary = FailingTransport::new("primary", 0);
        let dispatcher = EmailDispatcher::new(primary.clone(), directory()).with_retry(fast_retry());

        let result = dispatcher.send(&sample_intent(), &email_action()).await;
        assert!(result.success);
        assert_eq!(result.provider, "primary");
        assert_eq!(result.retry_count, 0);
    }

    #[tokio::test]
    async fn retries_then_succeeds_on_primary() {
        let primary = FailingTransport::new("primary", 2);
        let dispatcher = EmailDispatcher::new(primary.clone(), directory()).with_retry(fast_retry());

        let result = dispatcher.send(&sample_intent(), &email_action()).await;
        assert!(result.success);
        assert_eq!(result.provider, "primary");
        assert_eq!(result.retry_count, 2);
    }

    #[tokio::test]
    async fn falls_back_to_secondary() {
        let primary = FailingTransport::new("primary", 100);
        let secondary = FailingTransport::new("secondary", 0);
        let dispatcher = EmailDispatcher::new(primary.clone(), directory())
            .with_secondary(secondary.clone())
            .with_retry(fast_retry());

        let result = dispatcher.send(&sample_intent(), &email_action()).await;
        assert!(result.success);
        assert_eq!(result.provider, "secondary");
        assert!(result.retry_count >= 1);
        assert_eq!(primary.attempts(), 3);
    }

    #[tokio::test]
    async fn total_failure_reports_last_provider() {
        let primary = FailingTransport::new("primary", 100);
        let secondary = FailingTransport::new("secondary", 100);
        let dispatcher = EmailDispatcher::new(primary, directory())
            .with_secondary(secondary)
            .with_retry(fast_retry());

        let result = dispatcher.send(&sample_intent(), &email_action()).await;
        assert!(!result.success);
        assert_eq!(result.provider, "secondary");
        assert_eq!(result.retry_count, 5);
        assert!(result.error_message.is_some());
    }

    #[tokio::test]
    async fn unknown_owner_is_structural_skip() {
        let primary = FailingTransport::new("primary", 0);
        let dispatcher =
            EmailDispatcher::new(primary.clone(), Arc::new(StaticDirectory::new()))
                .with_retry(fast_retry());

        let result = dispatcher.send(&sample_intent(), &email_action()).await;
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("skipped"));
        assert_eq!(primary.attempts(), 0);
    }

    #[tokio::test]
    async fn config_override_takes_precedence() {
        let primary = FailingTransport::new("primary", 0);
        let dispatcher = EmailDispatcher::new(primary, Arc::new(StaticDirectory::new()))
            .with_retry(fast_retry());

        let action: ChannelAction = serde_json::from_value(
            json!({"channel": "email", "config": {"to": "override@example.com"}}),
        )
        .unwrap();
        let result = dispatcher.send(&sample_intent(), &action).await;
        assert!(result.success);
    }
}
