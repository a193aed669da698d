use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::engine::no_symptoms_result;
use super::normalize::normalize;
use super::scoring::round_confidence;
use super::types::{DiagnosisError, DiagnosisResult, Diagnoser, Severity, Urgency};

/// Blocking HTTP client for an external statistical classifier that speaks
/// the same output contract (`POST {base}/analyze`).
///
/// Calls block; async callers must go through `spawn_blocking`. The client
/// must also be created and dropped outside an async runtime.
pub struct RemoteDiagnoser {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl RemoteDiagnoser {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, DiagnosisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DiagnosisError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    symptoms: &'a str,
}

/// Response body of the external classifier. Older deployments send
/// `needs_doctor` and omit several fields.
#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    diagnosis: String,
    #[serde(default)]
    condition_key: Option<String>,
    #[serde(default)]
    identified_symptoms: Vec<String>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    recommendation: String,
    #[serde(default)]
    requires_doctor: Option<bool>,
    #[serde(default)]
    needs_doctor: Option<bool>,
    #[serde(default)]
    urgency: Option<Urgency>,
    #[serde(default)]
    severity: Option<Severity>,
}

impl From<AnalyzeResponse> for DiagnosisResult {
    fn from(r: AnalyzeResponse) -> Self {
        // Without urgency, a named condition is a plain match and anything
        // else is the classifier's "no clear diagnosis".
        let urgency = r.urgency.unwrap_or(if r.condition_key.is_some() {
            Urgency::Low
        } else {
            Urgency::Unknown
        });
        let identified: BTreeSet<String> = r.identified_symptoms.into_iter().collect();

        if urgency == Urgency::Unknown {
            return Self {
                diagnosis: r.diagnosis,
                condition_key: None,
                identified_symptoms: identified.into_iter().collect(),
                confidence: 0.0,
                recommendation: r.recommendation,
                requires_doctor: true,
                urgency,
                severity: None,
            };
        }

        Self {
            diagnosis: r.diagnosis,
            condition_key: r.condition_key,
            identified_symptoms: identified.into_iter().collect(),
            confidence: round_confidence(r.confidence.clamp(0.0, 1.0)),
            recommendation: r.recommendation,
            requires_doctor: r
                .requires_doctor
                .or(r.needs_doctor)
                .unwrap_or_else(|| urgency.calls_for_doctor()),
            urgency,
            severity: r.severity,
        }
    }
}

impl Diagnoser for RemoteDiagnoser {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn diagnose(&self, text: &str) -> Result<DiagnosisResult, DiagnosisError> {
        // The remote service rejects blank input; locally that is simply
        // "nothing identified".
        if normalize(text).is_empty() {
            return Ok(no_symptoms_result());
        }

        let url = format!("{}/analyze", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { symptoms: text })
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    DiagnosisError::Unreachable(self.base_url.clone())
                } else if e.is_timeout() {
                    DiagnosisError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    DiagnosisError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DiagnosisError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnalyzeResponse = response
            .json()
            .map_err(|e| DiagnosisError::ResponseParsing(e.to_string()))?;

        Ok(parsed.into())
    }
}
