use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Accepts engine level names; inconsistencies count as errors.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ERROR" | "FATAL" | "CRITICAL" | "INCONSISTENCY" => Ok(Severity::Error),
            "WARNING" | "WARN" => Ok(Severity::Warning),
            "INFO" | "INFORMATION" | "DEBUG" => Ok(Severity::Info),
            _ => Err(format!("Unknown severity: {s}")),
        }
    }
}

/// One raw log entry from the validation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub code: String,
    #[serde(default, alias = "message", deserialize_with = "null_as_empty")]
    pub raw_message: String,
    #[serde(default, alias = "level", deserialize_with = "lenient_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub refs: Vec<String>,
    #[serde(default, alias = "conceptNs")]
    pub concept_ns: Option<String>,
    #[serde(default, alias = "conceptLn")]
    pub concept_ln: Option<String>,
    #[serde(default, alias = "contextRef")]
    pub context_ref: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_severity<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(|value| value.parse().ok())
        .unwrap_or_default())
}

impl RawEvent {
    pub fn new(code: impl Into<String>, raw_message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.into(),
            raw_message: raw_message.into(),
            severity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_refs(mut self, refs: Vec<String>) -> Self {
        self.refs = refs;
        self
    }

    #[must_use]
    pub fn with_concept(
        mut self,
        concept_ns: impl Into<String>,
        concept_ln: impl Into<String>,
        context_ref: impl Into<String>,
    ) -> Self {
        self.concept_ns = Some(concept_ns.into());
        self.concept_ln = Some(concept_ln.into());
        self.context_ref = Some(context_ref.into());
        self
    }
}
