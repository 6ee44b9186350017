use serde::{Deserialize, Serialize};

/// One observed vulnerability record as handed over by the vulnerability
/// store. Every field the rule condition DSL can reference lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub cve_id: String,
    pub title: String,
    pub severity: Severity,
    pub cvss_score: Option<f64>,
    #[serde(default)]
    pub affected_software: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub exploit_available: bool,
    #[serde(default)]
    pub patch_available: bool,
    #[serde(default)]
    pub kev: bool,
    #[serde(default)]
    pub trending: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cwe_id: Option<String>,
    pub observed_at_ms: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MED",
            Self::High => "HIGH",
            Self::Critical => "CRIT",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}
