use serde_json::Value;
use vulnwatch_common::vuln::Vulnerability;

use super::rule::{ConditionClause, ConditionField, ConditionOperator};

/// Outcome of evaluating a rule's clauses against one vulnerability. The
/// matched subset is kept for the audit trail.
#[derive(Debug, Clone)]
pub struct ConditionMatch {
    pub matched: bool,
    pub matched_clauses: Vec<ConditionClause>,
}

/// Evaluates all clauses independently and ANDs the results. Pure and total:
/// missing fields and shape mismatches are non-matches, never errors. An
/// empty clause set matches nothing (rejected at rule creation, guarded here
/// anyway).
pub fn evaluate(vuln: &Vulnerability, clauses: &[ConditionClause]) -> ConditionMatch {
    let mut matched_clauses = Vec::new();

    for clause in clauses {
        if clause_matches(vuln, clause) {
            matched_clauses.push(clause.clone());
        }
    }

    ConditionMatch {
        matched: !clauses.is_empty() && matched_clauses.len() == clauses.len(),
        matched_clauses,
    }
}

enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
    List(Vec<String>),
    Missing,
}

fn field_value(vuln: &Vulnerability, field: ConditionField) -> FieldValue {
    match field {
        ConditionField::Severity => FieldValue::Text(vuln.severity.as_str().to_string()),
        ConditionField::CvssScore => match vuln.cvss_score {
            Some(score) => FieldValue::Number(score),
            None => FieldValue::Missing,
        },
        ConditionField::AffectedSoftware => FieldValue::List(vuln.affected_software.clone()),
        ConditionField::Category => match &vuln.category {
            Some(c) => FieldValue::Text(c.clone()),
            None => FieldValue::Missing,
        },
        ConditionField::ExploitAvailable => FieldValue::Flag(vuln.exploit_available),
        ConditionField::PatchAvailable => FieldValue::Flag(vuln.patch_available),
        ConditionField::Kev => FieldValue::Flag(vuln.kev),
        ConditionField::Trending => FieldValue::Flag(vuln.trending),
        ConditionField::Tags => FieldValue::List(vuln.tags.clone()),
        ConditionField::CweId => match &vuln.cwe_id {
            Some(c) => FieldValue::Text(c.clone()),
            None => FieldValue::Missing,
        },
    }
}

fn clause_matches(vuln: &Vulnerability, clause: &ConditionClause) -> bool {
    let field = field_value(vuln, clause.field);
    match clause.operator {
        ConditionOperator::Equals => eval_equals(&field, &clause.value),
        ConditionOperator::In => eval_in(&field, &clause.value),
        ConditionOperator::Gte => eval_numeric(&field, &clause.value, |a, b| a >= b),
        ConditionOperator::Lte => eval_numeric(&field, &clause.value, |a, b| a <= b),
        ConditionOperator::Contains => eval_contains(&field, &clause.value),
    }
}

fn eval_equals(field: &FieldValue, expected: &Value) -> bool {
    match field {
        FieldValue::Text(s) => match expected.as_str() {
            Some(e) => s.eq_ignore_ascii_case(e),
            None => false,
        },
        FieldValue::Number(n) => match as_f64(expected) {
            Some(e) => (n - e).abs() < f64::EPSILON,
            None => false,
        },
        FieldValue::Flag(b) => expected.as_bool() == Some(*b),
        // Equality on an array field is a non-match; `in`/`contains` are the
        // array operators.
        FieldValue::List(_) | FieldValue::Missing => false,
    }
}

fn eval_in(field: &FieldValue, expected: &Value) -> bool {
    let Some(set) = expected.as_array() else {
        return false;
    };
    match field {
        FieldValue::Text(s) => set
            .iter()
            .filter_map(|v| v.as_str())
            .any(|e| s.eq_ignore_ascii_case(e)),
        FieldValue::Number(n) => set
            .iter()
            .filter_map(as_f64)
            .any(|e| (n - e).abs() < f64::EPSILON),
        FieldValue::List(items) => set.iter().filter_map(|v| v.as_str()).any(|e| {
            items.iter().any(|item| item.eq_ignore_ascii_case(e))
        }),
        FieldValue::Flag(_) | FieldValue::Missing => false,
    }
}

fn eval_numeric(field: &FieldValue, expected: &Value, cmp: fn(f64, f64) -> bool) -> bool {
    let lhs = match field {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => match s.parse::<f64>() {
            Ok(n) => n,
            Err(_) => return false,
        },
        _ => return false,
    };
    match as_f64(expected) {
        Some(rhs) => cmp(lhs, rhs),
        None => false,
    }
}

fn eval_contains(field: &FieldValue, expected: &Value) -> bool {
    let Some(needle) = expected.as_str() else {
        return false;
    };
    match field {
        FieldValue::Text(s) => s.to_lowercase().contains(&needle.to_lowercase()),
        FieldValue::List(items) => items.iter().any(|item| item.eq_ignore_ascii_case(needle)),
        FieldValue::Number(_) | FieldValue::Flag(_) | FieldValue::Missing => false,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vulnwatch_common::vuln::Severity;

    fn sample_vuln() -> Vulnerability {
        Vulnerability {
            id: "v-1".into(),
            cve_id: "CVE-2024-12345".into(),
            title: "Remote code execution in libexample".into(),
            severity: Severity::Critical,
            cvss_score: Some(9.8),
            affected_software: vec!["libexample".into(), "OpenSSL".into()],
            category: Some("rce".into()),
            exploit_available: true,
            patch_available: false,
            kev: true,
            trending: false,
            tags: vec!["remote".into(), "network".into()],
            cwe_id: Some("CWE-787".into()),
            observed_at_ms: 1_700_000_000_000,
        }
    }

    fn clause(field: ConditionField, op: ConditionOperator, value: serde_json::Value) -> ConditionClause {
        ConditionClause {
            field,
            operator: op,
            value,
        }
    }

    #[test]
    fn equals_severity_case_insensitive() {
        let c = clause(
            ConditionField::Severity,
            ConditionOperator::Equals,
            json!("CRITICAL"),
        );
        assert!(evaluate(&sample_vuln(), &[c]).matched);
    }

    #[test]
    fn equals_severity_mismatch() {
        let c = clause(
            ConditionField::Severity,
            ConditionOperator::Equals,
            json!("high"),
        );
        assert!(!evaluate(&sample_vuln(), &[c]).matched);
    }

    #[test]
    fn equals_boolean_field() {
        let hit = clause(
            ConditionField::ExploitAvailable,
            ConditionOperator::Equals,
            json!(true),
        );
        let miss = clause(
            ConditionField::PatchAvailable,
            ConditionOperator::Equals,
            json!(true),
        );
        assert!(evaluate(&sample_vuln(), &[hit]).matched);
        assert!(!evaluate(&sample_vuln(), &[miss]).matched);
    }

    #[test]
    fn equals_on_array_field_never_matches() {
        let c = clause(
            ConditionField::Tags,
            ConditionOperator::Equals,
            json!("remote"),
        );
        assert!(!evaluate(&sample_vuln(), &[c]).matched);
    }

    #[test]
    fn gte_lte_on_cvss() {
        let gte = clause(ConditionField::CvssScore, ConditionOperator::Gte, json!(9.0));
        let lte = clause(ConditionField::CvssScore, ConditionOperator::Lte, json!(9.0));
        assert!(evaluate(&sample_vuln(), &[gte]).matched);
        assert!(!evaluate(&sample_vuln(), &[lte]).matched);
    }

    #[test]
    fn gte_coerces_string_value() {
        let c = clause(
            ConditionField::CvssScore,
            ConditionOperator::Gte,
            json!("7.5"),
        );
        assert!(evaluate(&sample_vuln(), &[c]).matched);
    }

    #[test]
    fn numeric_op_on_non_numeric_field_is_non_match() {
        let c = clause(ConditionField::Category, ConditionOperator::Gte, json!(1.0));
        assert!(!evaluate(&sample_vuln(), &[c]).matched);
    }

    #[test]
    fn missing_field_is_non_match_not_error() {
        let mut vuln = sample_vuln();
        vuln.cvss_score = None;
        vuln.cwe_id = None;
        let score = clause(ConditionField::CvssScore, ConditionOperator::Gte, json!(0.0));
        let cwe = clause(
            ConditionField::CweId,
            ConditionOperator::Equals,
            json!("CWE-787"),
        );
        assert!(!evaluate(&vuln, &[score]).matched);
        assert!(!evaluate(&vuln, &[cwe]).matched);
    }

    #[test]
    fn in_with_scalar_field() {
        let c = clause(
            ConditionField::Severity,
            ConditionOperator::In,
            json!(["high", "critical"]),
        );
        assert!(evaluate(&sample_vuln(), &[c]).matched);
    }

    #[test]
    fn in_with_array_field_intersects() {
        let hit = clause(
            ConditionField::AffectedSoftware,
            ConditionOperator::In,
            json!(["openssl", "zlib"]),
        );
        let miss = clause(
            ConditionField::AffectedSoftware,
            ConditionOperator::In,
            json!(["zlib", "curl"]),
        );
        assert!(evaluate(&sample_vuln(), &[hit]).matched);
        assert!(!evaluate(&sample_vuln(), &[miss]).matched);
    }

    #[test]
    fn in_with_non_array_value_is_non_match() {
        let c = clause(
            ConditionField::Severity,
            ConditionOperator::In,
            json!("critical"),
        );
        assert!(!evaluate(&sample_vuln(), &[c]).matched);
    }

    #[test]
    fn contains_substring_case_insensitive() {
        let c = clause(
            ConditionField::CweId,
            ConditionOperator::Contains,
            json!("cwe-78"),
        );
        assert!(evaluate(&sample_vuln(), &[c]).matched);
    }

    #[test]
    fn contains_on_array_is_membership() {
        let hit = clause(
            ConditionField::Tags,
            ConditionOperator::Contains,
            json!("Remote"),
        );
        let miss = clause(
            ConditionField::Tags,
            ConditionOperator::Contains,
            json!("local"),
        );
        assert!(evaluate(&sample_vuln(), &[hit]).matched);
        assert!(!evaluate(&sample_vuln(), &[miss]).matched);
    }

    #[test]
    fn all_clauses_must_match() {
        let severity = clause(
            ConditionField::Severity,
            ConditionOperator::Equals,
            json!("critical"),
        );
        let kev = clause(ConditionField::Kev, ConditionOperator::Equals, json!(true));
        let both = evaluate(&sample_vuln(), &[severity.clone(), kev.clone()]);
        assert!(both.matched);
        assert_eq!(both.matched_clauses.len(), 2);

        let trending = clause(
            ConditionField::Trending,
            ConditionOperator::Equals,
            json!(true),
        );
        let partial = evaluate(&sample_vuln(), &[severity, kev, trending]);
        assert!(!partial.matched);
        assert_eq!(partial.matched_clauses.len(), 2);
    }

    #[test]
    fn empty_clause_set_matches_nothing() {
        assert!(!evaluate(&sample_vuln(), &[]).matched);
    }
}
