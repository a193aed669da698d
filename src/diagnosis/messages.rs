//! User-facing strings for diagnosis results.

use super::types::Condition;

pub const NO_SYMPTOMS_DIAGNOSIS: &str =
    "Unable to identify specific symptoms. Please provide more detail.";
pub const NOT_RECOGNIZED_DIAGNOSIS: &str = "Symptoms not recognized in our database.";
pub const CONSULT_PROFESSIONAL: &str = "Consult a healthcare professional.";

const HIGH_CONFIDENCE_PREFIX: &str = "High confidence prediction.";
const LOW_CONFIDENCE_PREFIX: &str = "Low confidence prediction.";
const HIGH_CONFIDENCE_ABOVE: f64 = 0.7;
const LOW_CONFIDENCE_BELOW: f64 = 0.4;

/// `"Possible <DisplayName>"`.
pub fn diagnosis_label(condition: &Condition) -> String {
    format!("Possible {}", condition.display_name)
}

/// Treatment text, qualified by how sure the match is.
pub fn recommendation(condition: &Condition, confidence: f64) -> String {
    let treatment = condition.treatment.trim();
    let base = if treatment.is_empty() {
        CONSULT_PROFESSIONAL
    } else {
        treatment
    };

    if confidence > HIGH_CONFIDENCE_ABOVE {
        format!("{HIGH_CONFIDENCE_PREFIX} {base}")
    } else if confidence < LOW_CONFIDENCE_BELOW {
        format!("{LOW_CONFIDENCE_PREFIX} {base}")
    } else {
        base.to_string()
    }
}
