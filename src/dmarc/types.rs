use serde::{Deserialize, Serialize};

/// One DMARC aggregate report, as published by a receiving mail system.
///
/// The serialized form (JSON output, template context) uses the plural
/// `records`/`errors` keys; deserialization accepts both the singular XML
/// element names and the plural keys so previously emitted JSON reports can
/// be re-ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub version: String,
    pub report_metadata: ReportMetadata,
    pub policy_published: PolicyPublished,
    #[serde(
        rename(serialize = "records", deserialize = "record"),
        alias = "records",
        default
    )]
    pub records: Vec<Record>,
}

impl Report {
    /// Total message count across all records.
    pub fn total_messages(&self) -> u64 {
        self.records.iter().map(|r| r.row.count).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub org_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub extra_contact_info: String,
    #[serde(default)]
    pub report_id: String,
    pub date_range: DateRange,
    #[serde(
        rename(serialize = "errors", deserialize = "error"),
        alias = "errors",
        default
    )]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub begin: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyPublished {
    pub domain: String,
    #[serde(default)]
    pub adkim: String,
    #[serde(default)]
    pub aspf: String,
    #[serde(default)]
    pub p: String,
    #[serde(default)]
    pub sp: String,
    #[serde(default)]
    pub pct: i32,
    #[serde(default)]
    pub fo: String,
    #[serde(default)]
    pub np: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub row: Row,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(default)]
    pub auth_results: AuthResults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub source_ip: String,
    /// Resolved reverse-DNS name for `source_ip`; empty when lookups are
    /// disabled, skipped, or failed.
    #[serde(default)]
    pub source_hostname: String,
    #[serde(default)]
    pub count: u64,
    pub policy_evaluated: PolicyEvaluated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyEvaluated {
    #[serde(default)]
    pub disposition: String,
    #[serde(default)]
    pub dkim: String,
    #[serde(default)]
    pub spf: String,
    #[serde(
        rename(serialize = "reasons", deserialize = "reason"),
        alias = "reasons",
        default
    )]
    pub reasons: Vec<PolicyOverrideReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyOverrideReason {
    #[serde(rename = "type", default)]
    pub reason_type: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identifiers {
    #[serde(default)]
    pub header_from: String,
    #[serde(default)]
    pub envelope_from: String,
    #[serde(default)]
    pub envelope_to: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResults {
    #[serde(default)]
    pub dkim: Vec<DkimAuthResult>,
    #[serde(default)]
    pub spf: Vec<SpfAuthResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DkimAuthResult {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub human_result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpfAuthResult {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub result: String,
}

#[cfg(test)]
impl Report {
    /// Minimal report fixture used across the crate's unit tests.
    pub(crate) fn sample(org_name: &str, email: &str, domain: &str) -> Self {
        Report {
            version: String::new(),
            report_metadata: ReportMetadata {
                org_name: org_name.to_string(),
                email: email.to_string(),
                extra_contact_info: String::new(),
                report_id: format!("{}-001", domain),
                date_range: DateRange {
                    begin: 1_700_000_000,
                    end: 1_700_086_400,
                },
                errors: Vec::new(),
            },
            policy_published: PolicyPublished {
                domain: domain.to_string(),
                adkim: "r".to_string(),
                aspf: "r".to_string(),
                p: "none".to_string(),
                sp: "none".to_string(),
                pct: 100,
                fo: String::new(),
                np: String::new(),
            },
            records: vec![Record {
                row: Row {
                    source_ip: "192.0.2.1".to_string(),
                    source_hostname: String::new(),
                    count: 2,
                    policy_evaluated: PolicyEvaluated {
                        disposition: "none".to_string(),
                        dkim: "pass".to_string(),
                        spf: "pass".to_string(),
                        reasons: Vec::new(),
                    },
                },
                identifiers: Identifiers {
                    header_from: domain.to_string(),
                    envelope_from: String::new(),
                    envelope_to: String::new(),
                },
                auth_results: AuthResults::default(),
            }],
        }
    }
}
