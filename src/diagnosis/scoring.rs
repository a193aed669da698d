use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::knowledge::KnowledgeBase;
use super::types::{ScoredCondition, Severity};

/// Upper bound on any blended confidence.
const CONFIDENCE_CAP: f64 = 0.99;
/// Weight of the profile-coverage score in the blended formula.
const SCORE_WEIGHT: f64 = 0.85;
/// Bonus per identified symptom, and its ceiling.
const SYMPTOM_BONUS_STEP: f64 = 0.05;
const SYMPTOM_BONUS_CAP: f64 = 0.15;

/// How a coverage score becomes a confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceFormula {
    /// `confidence = score`.
    Proportion,
    /// `min(0.99, score * 0.85 + min(0.15, 0.05 * identified))`.
    Blended,
}

/// Inclusion thresholds per severity tier plus the confidence formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub min_matches_low: usize,
    pub min_matches_medium: usize,
    /// High-severity conditions need more corroboration by default so that a
    /// single shared symptom cannot select them.
    pub min_matches_high: usize,
    pub confidence: ConfidenceFormula,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            min_matches_low: 1,
            min_matches_medium: 1,
            min_matches_high: 2,
            confidence: ConfidenceFormula::Blended,
        }
    }
}

impl ScoringPolicy {
    /// One match includes any condition; confidence equals the score.
    pub fn ungated() -> Self {
        Self {
            min_matches_low: 1,
            min_matches_medium: 1,
            min_matches_high: 1,
            confidence: ConfidenceFormula::Proportion,
        }
    }

    /// Minimum matched symptoms for a condition of this severity. Never below 1.
    pub fn min_matches(&self, severity: Severity) -> usize {
        let min = match severity {
            Severity::Low => self.min_matches_low,
            Severity::Medium => self.min_matches_medium,
            Severity::High => self.min_matches_high,
        };
        min.max(1)
    }
}

/// Score every condition that reaches its inclusion threshold.
///
/// Sorted best first: descending score, ties broken by ascending key.
pub fn score_conditions(
    identified: &BTreeSet<String>,
    knowledge: &KnowledgeBase,
    policy: &ScoringPolicy,
) -> Vec<ScoredCondition> {
    if identified.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredCondition> = knowledge
        .conditions()
        .filter_map(|condition| {
            let matched = condition.symptoms.intersection(identified).count();
            if matched < policy.min_matches(condition.severity) {
                return None;
            }
            let profile_size = condition.symptoms.len();
            Some(ScoredCondition {
                key: condition.key.clone(),
                matched,
                profile_size,
                score: matched as f64 / profile_size as f64,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
    scored
}

/// Derive a confidence from a coverage score and the number of identified symptoms.
pub fn compute_confidence(score: f64, identified: usize, formula: ConfidenceFormula) -> f64 {
    let raw = match formula {
        ConfidenceFormula::Proportion => score,
        ConfidenceFormula::Blended => {
            let bonus = (SYMPTOM_BONUS_STEP * identified as f64).min(SYMPTOM_BONUS_CAP);
            (score * SCORE_WEIGHT + bonus).min(CONFIDENCE_CAP)
        }
    };
    raw.clamp(0.0, 1.0)
}

/// Round to two decimals for presentation.
pub fn round_confidence(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::diagnosis::types::Condition;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn condition(key: &str, symptoms: &[&str], severity: Severity) -> Condition {
        Condition {
            key: key.into(),
            display_name: key.to_uppercase(),
            symptoms: set(symptoms),
            treatment: String::new(),
            severity,
            requires_doctor: false,
        }
    }

    fn kb(conditions: Vec<Condition>) -> KnowledgeBase {
        KnowledgeBase::new(conditions, BTreeMap::new()).unwrap()
    }

    #[test]
    fn score_is_fraction_of_condition_profile() {
        let knowledge = kb(vec![condition(
            "four",
            &["a_one", "b_two", "c_three", "d_four"],
            Severity::Low,
        )]);
        let scored = score_conditions(
            &set(&["a_one", "c_three", "unrelated"]),
            &knowledge,
            &ScoringPolicy::default(),
        );
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].matched, 2);
        assert_eq!(scored[0].profile_size, 4);
        assert_eq!(scored[0].score, 0.5);
    }

    #[test]
    fn empty_identified_scores_nothing() {
        let knowledge = kb(vec![condition("x", &["fever"], Severity::Low)]);
        assert!(score_conditions(&BTreeSet::new(), &knowledge, &ScoringPolicy::default()).is_empty());
    }

    #[test]
    fn unmatched_conditions_are_excluded() {
        let knowledge = kb(vec![
            condition("x", &["fever"], Severity::Low),
            condition("y", &["rash"], Severity::Low),
        ]);
        let scored = score_conditions(&set(&["fever"]), &knowledge, &ScoringPolicy::default());
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].key, "x");
    }

    #[test]
    fn ties_break_on_smallest_key() {
        let knowledge = kb(vec![
            condition("zeta", &["fever", "cough"], Severity::Low),
            condition("alpha", &["fever", "rash"], Severity::Low),
            condition("mu", &["fever", "chills"], Severity::Low),
        ]);
        for _ in 0..10 {
            let scored = score_conditions(&set(&["fever"]), &knowledge, &ScoringPolicy::default());
            let keys: Vec<&str> = scored.iter().map(|s| s.key.as_str()).collect();
            assert_eq!(keys, vec!["alpha", "mu", "zeta"]);
        }
    }

    #[test]
    fn higher_score_beats_smaller_key() {
        let knowledge = kb(vec![
            condition("alpha", &["fever", "rash", "chills"], Severity::Low),
            condition("beta", &["fever", "cough"], Severity::Low),
        ]);
        let scored = score_conditions(&set(&["fever", "cough"]), &knowledge, &ScoringPolicy::default());
        assert_eq!(scored[0].key, "beta");
        assert_eq!(scored[0].score, 1.0);
    }

    #[test]
    fn high_severity_needs_two_matches_by_default() {
        let knowledge = kb(vec![
            condition("serious", &["fever", "stiff_neck"], Severity::High),
            condition("mild", &["fever", "a_b", "c_d", "e_f"], Severity::Low),
        ]);
        let scored = score_conditions(&set(&["fever"]), &knowledge, &ScoringPolicy::default());
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].key, "mild");

        let scored = score_conditions(
            &set(&["fever", "stiff_neck"]),
            &knowledge,
            &ScoringPolicy::default(),
        );
        assert_eq!(scored[0].key, "serious");
    }

    #[test]
    fn ungated_policy_admits_single_match_on_high_severity() {
        let knowledge = kb(vec![
            condition("serious", &["fever", "stiff_neck"], Severity::High),
            condition("mild", &["fever", "a_b", "c_d", "e_f"], Severity::Low),
        ]);
        let scored = score_conditions(&set(&["fever"]), &knowledge, &ScoringPolicy::ungated());
        assert_eq!(scored[0].key, "serious");
        assert_eq!(scored[0].score, 0.5);
    }

    #[test]
    fn zero_threshold_is_treated_as_one() {
        let policy = ScoringPolicy {
            min_matches_low: 0,
            ..ScoringPolicy::default()
        };
        assert_eq!(policy.min_matches(Severity::Low), 1);
        let knowledge = kb(vec![condition("x", &["rash"], Severity::Low)]);
        assert!(score_conditions(&set(&["fever"]), &knowledge, &policy).is_empty());
    }

    #[test]
    fn proportion_confidence_is_the_score() {
        assert_eq!(compute_confidence(0.6, 3, ConfidenceFormula::Proportion), 0.6);
    }

    #[test]
    fn blended_confidence_bonus_is_capped() {
        let c = compute_confidence(0.5, 10, ConfidenceFormula::Blended);
        assert!((c - (0.5 * 0.85 + 0.15)).abs() < 1e-9);
        let c = compute_confidence(0.5, 1, ConfidenceFormula::Blended);
        assert!((c - (0.5 * 0.85 + 0.05)).abs() < 1e-9);
    }

    #[test]
    fn blended_confidence_never_reaches_certainty() {
        assert_eq!(compute_confidence(1.0, 6, ConfidenceFormula::Blended), 0.99);
    }

    #[test]
    fn blended_confidence_is_monotonic() {
        let mut previous = 0.0;
        for matched in 1..=5 {
            let score = matched as f64 / 5.0;
            let c = compute_confidence(score, matched, ConfidenceFormula::Blended);
            assert!(c >= previous, "confidence dropped at {matched}");
            previous = c;
        }
    }

    #[test]
    fn rounding_to_two_decimals() {
        assert_eq!(round_confidence(0.6666), 0.67);
        assert_eq!(round_confidence(0.0), 0.0);
        assert_eq!(round_confidence(0.99), 0.99);
    }
}
