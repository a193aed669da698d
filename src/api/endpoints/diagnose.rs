//! Diagnosis endpoint, served at both `/diagnose` and `/analyze`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::diagnosis::DiagnosisResult;

#[derive(Debug, Deserialize)]
pub struct DiagnoseRequest {
    #[serde(default)]
    pub symptoms: Option<serde_json::Value>,
}

impl DiagnoseRequest {
    /// Symptom text. Scalars are read as their text, a list of scalars as
    /// a comma-separated description; objects are rejected.
    pub fn symptom_text(self) -> Result<String, ApiError> {
        match self.symptoms {
            None => Ok(String::new()),
            Some(value) => value_text(value)
                .ok_or_else(|| ApiError::BadRequest("Symptoms must be text".into())),
        }
    }
}

fn value_text(value: serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Array(_) | Value::Object(_) => None,
                scalar => value_text(scalar),
            })
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(", ")),
        Value::Object(_) => None,
    }
}

/// The result plus `needs_doctor`, the name older clients read.
#[derive(Debug, Serialize)]
pub struct DiagnoseResponse {
    #[serde(flatten)]
    pub result: DiagnosisResult,
    pub needs_doctor: bool,
}

impl From<DiagnosisResult> for DiagnoseResponse {
    fn from(result: DiagnosisResult) -> Self {
        Self {
            needs_doctor: result.requires_doctor,
            result,
        }
    }
}

/// `POST /diagnose`: free-text symptoms in, ranked diagnosis out.
///
/// Missing, malformed, blank or structured input is rejected here; everything else,
/// including text in which nothing is recognized, is a 200.
pub async fn diagnose(
    State(ctx): State<ApiContext>,
    body: Result<Json<DiagnoseRequest>, JsonRejection>,
) -> Result<Json<DiagnoseResponse>, ApiError> {
    let symptoms = match body {
        Ok(Json(request)) => request.symptom_text()?,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable diagnose body");
            String::new()
        }
    };
    if symptoms.trim().is_empty() {
        return Err(ApiError::BadRequest("No symptoms provided".into()));
    }

    let diagnoser = ctx.diagnoser.clone();
    let result = tokio::task::spawn_blocking(move || diagnoser.diagnose(&symptoms)).await??;

    tracing::info!(
        strategy = ctx.diagnoser.name(),
        matched = result.is_match(),
        identified = result.identified_symptoms.len(),
        urgency = result.urgency.as_str(),
        "Diagnose request served"
    );

    Ok(Json(result.into()))
}
