use std::collections::BTreeSet;
use std::sync::Arc;

use super::extraction::extract_symptoms_enriched;
use super::knowledge::KnowledgeBase;
use super::lexicon::Lexicon;
use super::messages;
use super::scoring::{compute_confidence, round_confidence, score_conditions, ScoringPolicy};
use super::types::{DiagnosisError, DiagnosisResult, Diagnoser, KnowledgeError, Urgency};
use super::urgency::{UrgencyClassifier, UrgencyPolicy};

/// Result for input in which no symptom was recognized.
pub fn no_symptoms_result() -> DiagnosisResult {
    DiagnosisResult {
        diagnosis: messages::NO_SYMPTOMS_DIAGNOSIS.to_string(),
        condition_key: None,
        identified_symptoms: Vec::new(),
        confidence: 0.0,
        recommendation: messages::CONSULT_PROFESSIONAL.to_string(),
        requires_doctor: true,
        urgency: Urgency::Unknown,
        severity: None,
    }
}

/// Result for recognized symptoms that no condition accepts. Echoes the symptoms.
pub fn not_recognized_result(identified: Vec<String>) -> DiagnosisResult {
    DiagnosisResult {
        diagnosis: messages::NOT_RECOGNIZED_DIAGNOSIS.to_string(),
        condition_key: None,
        identified_symptoms: identified,
        confidence: 0.0,
        recommendation: messages::CONSULT_PROFESSIONAL.to_string(),
        requires_doctor: true,
        urgency: Urgency::Unknown,
        severity: None,
    }
}

/// Deterministic rule-based diagnoser: normalize → extract → score → classify.
///
/// Holds only immutable data, so one instance serves all requests.
pub struct RuleBasedDiagnoser {
    knowledge: Arc<KnowledgeBase>,
    lexicon: Lexicon,
    scoring: ScoringPolicy,
    urgency: UrgencyClassifier,
}

impl RuleBasedDiagnoser {
    /// Fails if the urgency policy names conditions the knowledge base lacks.
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        lexicon: Lexicon,
        scoring: ScoringPolicy,
        urgency: UrgencyPolicy,
    ) -> Result<Self, KnowledgeError> {
        urgency.validate(&knowledge)?;
        let unreachable = lexicon.unreachable_variants(knowledge.aliases());
        if !unreachable.is_empty() {
            tracing::warn!(
                count = unreachable.len(),
                variants = ?unreachable,
                "Lexicon variants map to no known symptom and will never match"
            );
        }
        Ok(Self {
            knowledge,
            lexicon,
            scoring,
            urgency: UrgencyClassifier::new(urgency),
        })
    }

    /// Default policies with the bundled lexicon.
    pub fn with_defaults(knowledge: Arc<KnowledgeBase>) -> Result<Self, KnowledgeError> {
        Self::new(
            knowledge,
            Lexicon::builtin(),
            ScoringPolicy::default(),
            UrgencyPolicy::default(),
        )
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn scoring(&self) -> &ScoringPolicy {
        &self.scoring
    }

    /// Run the pipeline. Never fails: unmatched input is a sentinel result.
    pub fn evaluate(&self, text: &str) -> DiagnosisResult {
        let identified: BTreeSet<String> =
            extract_symptoms_enriched(text, self.knowledge.aliases(), &self.lexicon);
        if identified.is_empty() {
            tracing::debug!("No symptoms identified");
            return no_symptoms_result();
        }

        let scored = score_conditions(&identified, &self.knowledge, &self.scoring);
        let top = scored
            .first()
            .and_then(|s| self.knowledge.condition(&s.key).map(|c| (s, c)));
        let Some((top, condition)) = top else {
            tracing::debug!(identified = identified.len(), "No condition reached its threshold");
            return not_recognized_result(identified.into_iter().collect());
        };

        let confidence = round_confidence(compute_confidence(
            top.score,
            identified.len(),
            self.scoring.confidence,
        ));
        let assessment = self
            .urgency
            .classify(Some(condition), confidence, identified.len());

        tracing::debug!(
            condition = %condition.key,
            matched = top.matched,
            identified = identified.len(),
            candidates = scored.len(),
            confidence,
            urgency = assessment.urgency.as_str(),
            "Diagnosis complete"
        );

        DiagnosisResult {
            diagnosis: messages::diagnosis_label(condition),
            condition_key: Some(condition.key.clone()),
            identified_symptoms: identified.into_iter().collect(),
            confidence,
            recommendation: messages::recommendation(condition, confidence),
            requires_doctor: assessment.requires_doctor,
            urgency: assessment.urgency,
            severity: Some(condition.severity),
        }
    }
}

impl Diagnoser for RuleBasedDiagnoser {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    fn diagnose(&self, text: &str) -> Result<DiagnosisResult, DiagnosisError> {
        Ok(self.evaluate(text))
    }
}

/// Tries `primary`; on error logs and answers from `fallback`.
pub struct FallbackDiagnoser {
    primary: Box<dyn Diagnoser>,
    fallback: Box<dyn Diagnoser>,
}

impl FallbackDiagnoser {
    pub fn new(primary: Box<dyn Diagnoser>, fallback: Box<dyn Diagnoser>) -> Self {
        Self { primary, fallback }
    }
}

impl Diagnoser for FallbackDiagnoser {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn diagnose(&self, text: &str) -> Result<DiagnosisResult, DiagnosisError> {
        match self.primary.diagnose(text) {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Primary diagnoser failed, using fallback"
                );
                self.fallback.diagnose(text)
            }
        }
    }
}
