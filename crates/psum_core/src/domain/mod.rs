use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Label {
    Good,
    Bad,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Good => "Good",
            Label::Bad => "Bad",
        }
    }
}

/// One reviewed example summary from the reference corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabeledExample {
    pub content: String,
    pub label: Label,
    pub comments: Vec<String>,
    pub source: String,
    pub content_sha256: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(deny_unknown_fields)]
pub struct Timestamp {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Timestamp {
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SummarySection {
    pub title: String,
    pub start_timestamp: Timestamp,
    pub end_timestamp: Timestamp,
    pub text: String,
    #[serde(default)]
    pub important_points: Vec<String>,
}

/// Structured summary the agent must produce before formatting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SummaryDocument {
    pub title: String,
    pub tldr: String,
    pub actionable_takeaways: Vec<String>,
    #[serde(default)]
    pub script: Vec<SummarySection>,
    #[serde(default)]
    pub appendix: Vec<String>,
}

impl SummaryDocument {
    /// Parse model output into a summary and validate it. Accepts bare JSON or JSON wrapped in a
    /// markdown code fence.
    pub fn parse_strict(text: &str) -> Result<Self, AppError> {
        let body = unfence_json(text);
        let doc: SummaryDocument = serde_json::from_str(body).map_err(|e| {
            AppError::new("AI_SCHEMA_VIOLATION", "Summary is not valid SummaryDocument JSON")
                .with_details(e.to_string())
                .with_retryable(true)
        })?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems: Vec<String> = Vec::new();

        if self.title.trim().is_empty() {
            problems.push("title is empty".to_string());
        }
        if self.tldr.trim().is_empty() {
            problems.push("tldr is empty".to_string());
        }
        if self.actionable_takeaways.iter().all(|t| t.trim().is_empty()) {
            problems.push("actionable_takeaways has no entries".to_string());
        }
        if self.script.is_empty() {
            problems.push("script has no sections".to_string());
        }

        for (i, section) in self.script.iter().enumerate() {
            if section.title.trim().is_empty() {
                problems.push(format!("script[{i}].title is empty"));
            }
            if section.text.trim().is_empty() {
                problems.push(format!("script[{i}].text is empty"));
            }
            for (name, ts) in [
                ("start_timestamp", &section.start_timestamp),
                ("end_timestamp", &section.end_timestamp),
            ] {
                if ts.minutes >= 60 || ts.seconds >= 60 {
                    problems.push(format!("script[{i}].{name} has minutes/seconds >= 60"));
                }
            }
            if section.end_timestamp < section.start_timestamp {
                problems.push(format!("script[{i}].end_timestamp is before start_timestamp"));
            }
        }

        if problems.is_empty() {
            return Ok(());
        }
        Err(
            AppError::new("AI_SCHEMA_VIOLATION", "Summary does not match the required schema")
                .with_details(problems.join("; "))
                .with_retryable(true),
        )
    }
}

fn unfence_json(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}
