use std::net::SocketAddr;

/// Service settings, read once at startup. Every field has a development
/// default; NATS, Postgres and SMTP are optional collaborators and the
/// service falls back to in-memory stand-ins when they are not configured.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub rest_addr: SocketAddr,
    pub nats_url: Option<String>,
    pub database_url: Option<String>,
    pub max_concurrent_rules: usize,
    pub smtp: Option<SmtpConfig>,
    pub smtp_fallback: Option<SmtpConfig>,
    /// `owner=address,owner=address` pairs for the email channel.
    pub owner_emails: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            rest_addr: env_or("VULNWATCH_REST_ADDR", "0.0.0.0:8080")
                .parse()
                .unwrap_or_else(|_| "0.0.0.0:8080".parse().unwrap()),
            nats_url: std::env::var("NATS_URL").ok().filter(|v| !v.is_empty()),
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            max_concurrent_rules: env_or("VULNWATCH_MAX_CONCURRENT_RULES", "16")
                .parse()
                .unwrap_or(16),
            smtp: smtp_from_env("VULNWATCH_SMTP"),
            smtp_fallback: smtp_from_env("VULNWATCH_SMTP_FALLBACK"),
            owner_emails: std::env::var("VULNWATCH_OWNER_EMAILS").unwrap_or_default(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reads `<prefix>_HOST`, `_PORT`, `_USERNAME`, `_PASSWORD`, `_FROM`.
/// Host and from are required for the block to count as configured.
fn smtp_from_env(prefix: &str) -> Option<SmtpConfig> {
    let host = std::env::var(format!("{prefix}_HOST")).ok()?;
    let from = std::env::var(format!("{prefix}_FROM")).ok()?;
    Some(SmtpConfig {
        host,
        port: std::env::var(format!("{prefix}_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587),
        username: std::env::var(format!("{prefix}_USERNAME")).unwrap_or_default(),
        password: std::env::var(format!("{prefix}_PASSWORD")).unwrap_or_default(),
        from,
    })
}
