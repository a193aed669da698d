//! Knowledge base browsing.
//!
//! - `GET /conditions`: every condition, in key order
//! - `GET /conditions/:key`: one condition with its treatment text

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::diagnosis::{Condition, Severity};

#[derive(Debug, Serialize)]
pub struct ConditionSummary {
    pub key: String,
    pub name: String,
    pub severity: Severity,
    pub requires_doctor: bool,
    pub symptoms: Vec<String>,
}

impl From<&Condition> for ConditionSummary {
    fn from(c: &Condition) -> Self {
        Self {
            key: c.key.clone(),
            name: c.display_name.clone(),
            severity: c.severity,
            requires_doctor: c.requires_doctor,
            symptoms: c.symptoms.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConditionDetail {
    #[serde(flatten)]
    pub summary: ConditionSummary,
    pub treatment: String,
}

pub async fn list(State(ctx): State<ApiContext>) -> Json<Vec<ConditionSummary>> {
    Json(ctx.knowledge.conditions().map(ConditionSummary::from).collect())
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(key): Path<String>,
) -> Result<Json<ConditionDetail>, ApiError> {
    let condition = ctx
        .knowledge
        .condition(&key)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown condition: {key}")))?;

    Ok(Json(ConditionDetail {
        summary: condition.into(),
        treatment: condition.treatment.clone(),
    }))
}
