pub const STREAM_NAME: &str = "VULNWATCH_EVENTS";
pub const VULN_SUBJECT: &str = "vulnwatch.vulns.observed";
pub const AUDIT_SUBJECT: &str = "vulnwatch.audit.dispatch";
pub const CONSUMER_NAME: &str = "vulnwatch-engine";

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub name: String,
    pub subjects: Vec<String>,
    pub max_bytes: i64,
    pub max_age_secs: u64,
    pub num_replicas: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            name: STREAM_NAME.into(),
            subjects: vec![VULN_SUBJECT.into(), AUDIT_SUBJECT.into()],
            max_bytes: 536_870_912,
            max_age_secs: 86400 * 7,
            num_replicas: 1,
        }
    }
}
