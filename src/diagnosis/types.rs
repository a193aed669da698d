use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Static severity of a condition, fixed in the knowledge base.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

// ---------------------------------------------------------------------------
// Urgency
// ---------------------------------------------------------------------------

/// Triage tier computed per request.
/// Ordering: `Unknown < Low < Medium < High < Emergency`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// No condition identified.
    Unknown,
    Low,
    Medium,
    High,
    Emergency,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Emergency => "emergency",
        }
    }

    /// Tiers that on their own call for a doctor.
    pub fn calls_for_doctor(&self) -> bool {
        matches!(self, Self::High | Self::Emergency)
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// A condition in the knowledge base with its canonical symptom profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    /// Stable identifier, unique across the knowledge base.
    pub key: String,
    pub display_name: String,
    /// Canonical symptom names (snake_case identifiers).
    pub symptoms: BTreeSet<String>,
    pub treatment: String,
    pub severity: Severity,
    pub requires_doctor: bool,
}

// ---------------------------------------------------------------------------
// Scoring output
// ---------------------------------------------------------------------------

/// Per-request score of one condition against the identified symptoms.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCondition {
    pub key: String,
    /// Number of the condition's canonical symptoms present in the input.
    pub matched: usize,
    /// Size of the condition's canonical symptom profile.
    pub profile_size: usize,
    /// `matched / profile_size`, in `[0, 1]`.
    pub score: f64,
}

// ---------------------------------------------------------------------------
// DiagnosisResult
// ---------------------------------------------------------------------------

/// Outcome of one `diagnose` call. Sentinel outcomes (nothing identified,
/// nothing matched) carry `condition_key: None` and confidence 0.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisResult {
    pub diagnosis: String,
    pub condition_key: Option<String>,
    /// Canonical symptom names in lexicographic order.
    pub identified_symptoms: Vec<String>,
    pub confidence: f64,
    pub recommendation: String,
    pub requires_doctor: bool,
    pub urgency: Urgency,
    /// Static severity of the selected condition; `None` for sentinels.
    pub severity: Option<Severity>,
}

impl DiagnosisResult {
    /// Whether a condition was selected (as opposed to a sentinel outcome).
    ///
    /// Sentinels are the only results with unknown urgency. Remote matches
    /// from older classifiers may still lack a `condition_key`.
    pub fn is_match(&self) -> bool {
        self.urgency != Urgency::Unknown
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Defects in static configuration. Raised at construction, never per request.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Knowledge base load failed ({0}): {1}")]
    Load(String, String),

    #[error("Knowledge base parse failed ({0}): {1}")]
    Parse(String, String),

    #[error("Condition key must not be empty")]
    EmptyKey,

    #[error("Duplicate condition key: {0}")]
    DuplicateCondition(String),

    #[error("Condition {0} has no symptoms")]
    EmptyProfile(String),

    #[error("Condition {condition} lists symptom {symptom:?} which normalizes to nothing")]
    InvalidSymptom { condition: String, symptom: String },

    #[error("Alias {alias:?} for {canonical} normalizes to an empty phrase")]
    EmptyAlias { alias: String, canonical: String },

    #[error("Phrase {phrase:?} maps to both {first} and {second}")]
    ConflictingAlias {
        phrase: String,
        first: String,
        second: String,
    },

    #[error("Alias {alias:?} targets {canonical}, which no condition lists")]
    UnknownSymptom { alias: String, canonical: String },

    #[error("Policy references unknown condition: {0}")]
    UnknownCondition(String),
}

/// Failures of a diagnosis strategy. The rule-based engine never produces
/// these; they come from external collaborators.
#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("Diagnosis service is not reachable at {0}")]
    Unreachable(String),

    #[error("Diagnosis service returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed diagnosis response: {0}")]
    ResponseParsing(String),
}

// ---------------------------------------------------------------------------
// Diagnoser trait
// ---------------------------------------------------------------------------

/// One strategy implementing the `diagnose` contract.
///
/// Implementations are shared across request handlers, so they must be
/// `Send + Sync` and must not hold per-request state. Calls may block.
pub trait Diagnoser: Send + Sync {
    /// Short strategy name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Map free-text symptoms to a diagnosis result.
    /// Empty text is "zero symptoms identified", not an error.
    fn diagnose(&self, text: &str) -> Result<DiagnosisResult, DiagnosisError>;
}
