//! Parsing of the critique stage output.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

fn default_category() -> String {
    "content".to_string()
}

/// One problem found in the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Area of the problem (structure, length, seo, ...)
    #[serde(default = "default_category", alias = "type")]
    pub category: String,
    /// What is wrong
    pub description: String,
    /// How to fix it
    #[serde(alias = "proposed_fix", alias = "suggested_fix", alias = "solution")]
    pub fix: String,
    /// Optional severity label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Optional location in the draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Structured critique consumed by the final stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritiqueReport {
    /// Issues, most important first
    pub issues: Vec<Issue>,
}

impl CritiqueReport {
    /// Parse a model response into a report.
    ///
    /// Text around the JSON object (code fences, a stray sentence) is
    /// ignored. Issues beyond `max_issues` are dropped. A response without a
    /// well-formed object, or with an issue lacking a description or fix, is
    /// `MalformedCritique`.
    pub fn parse(raw: &str, max_issues: usize) -> CoreResult<Self> {
        let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
            return Err(CoreError::MalformedCritique("no JSON object in response".to_string()));
        };
        if end < start {
            return Err(CoreError::MalformedCritique("no JSON object in response".to_string()));
        }

        let mut report: Self = serde_json::from_str(&raw[start..=end])
            .map_err(|e| CoreError::MalformedCritique(format!("invalid critique JSON: {}", e)))?;

        if let Some(pos) = report
            .issues
            .iter()
            .position(|issue| issue.description.trim().is_empty() || issue.fix.trim().is_empty())
        {
            return Err(CoreError::MalformedCritique(format!(
                "issue {} has an empty description or fix",
                pos + 1
            )));
        }

        if report.issues.len() > max_issues {
            tracing::debug!(returned = report.issues.len(), kept = max_issues, "Truncating critique");
            report.issues.truncate(max_issues);
        }
        Ok(report)
    }

    /// Whether the critique found nothing to fix.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}
