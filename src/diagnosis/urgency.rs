use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::knowledge::KnowledgeBase;
use super::types::{Condition, KnowledgeError, Urgency};

/// Configured urgency rules. Condition sets hold knowledge-base keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyPolicy {
    pub emergency: BTreeSet<String>,
    pub urgent: BTreeSet<String>,
    /// Confidence a set member must exceed to be escalated.
    pub escalation_confidence: f64,
    pub medium_min_symptoms: usize,
    pub medium_confidence: f64,
}

impl Default for UrgencyPolicy {
    fn default() -> Self {
        Self {
            emergency: ["appendicitis"].iter().map(|s| s.to_string()).collect(),
            urgent: ["pneumonia", "covid19", "uti"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            escalation_confidence: 0.4,
            medium_min_symptoms: 3,
            medium_confidence: 0.6,
        }
    }
}

impl UrgencyPolicy {
    /// Same thresholds, no escalation sets.
    pub fn without_sets() -> Self {
        Self {
            emergency: BTreeSet::new(),
            urgent: BTreeSet::new(),
            ..Self::default()
        }
    }

    /// Every configured key must name a known condition.
    pub fn validate(&self, knowledge: &KnowledgeBase) -> Result<(), KnowledgeError> {
        match self
            .emergency
            .iter()
            .chain(&self.urgent)
            .find(|key| !knowledge.contains(key))
        {
            Some(unknown) => Err(KnowledgeError::UnknownCondition(unknown.clone())),
            None => Ok(()),
        }
    }
}

/// Urgency tier plus the doctor flag surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyAssessment {
    pub urgency: Urgency,
    pub requires_doctor: bool,
}

#[derive(Debug, Clone)]
pub struct UrgencyClassifier {
    policy: UrgencyPolicy,
}

impl UrgencyClassifier {
    pub fn new(policy: UrgencyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UrgencyPolicy {
        &self.policy
    }

    /// Classify a selected condition. First matching rule wins:
    /// emergency set, urgent set, broad corroborated match, otherwise low.
    /// No condition at all is `Unknown` and always refers to a doctor.
    pub fn classify(
        &self,
        condition: Option<&Condition>,
        confidence: f64,
        symptom_count: usize,
    ) -> UrgencyAssessment {
        let Some(condition) = condition else {
            return UrgencyAssessment {
                urgency: Urgency::Unknown,
                requires_doctor: true,
            };
        };

        let p = &self.policy;
        let urgency = if p.emergency.contains(&condition.key) && confidence > p.escalation_confidence
        {
            Urgency::Emergency
        } else if p.urgent.contains(&condition.key) && confidence > p.escalation_confidence {
            Urgency::High
        } else if symptom_count >= p.medium_min_symptoms && confidence > p.medium_confidence {
            Urgency::Medium
        } else {
            Urgency::Low
        };

        UrgencyAssessment {
            urgency,
            requires_doctor: urgency.calls_for_doctor() || condition.requires_doctor,
        }
    }
}

impl Default for UrgencyClassifier {
    fn default() -> Self {
        Self::new(UrgencyPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::diagnosis::types::Severity;

    fn condition(key: &str, requires_doctor: bool) -> Condition {
        Condition {
            key: key.into(),
            display_name: key.into(),
            symptoms: ["fever".to_string()].into_iter().collect(),
            treatment: String::new(),
            severity: Severity::Medium,
            requires_doctor,
        }
    }

    #[test]
    fn emergency_set_above_threshold() {
        let c = UrgencyClassifier::default();
        let a = c.classify(Some(&condition("appendicitis", true)), 0.41, 1);
        assert_eq!(a.urgency, Urgency::Emergency);
        assert!(a.requires_doctor);
    }

    #[test]
    fn emergency_set_at_threshold_falls_through() {
        let c = UrgencyClassifier::default();
        let a = c.classify(Some(&condition("appendicitis", false)), 0.4, 1);
        assert_eq!(a.urgency, Urgency::Low);
        assert!(!a.requires_doctor);
    }

    #[test]
    fn urgent_set_is_high() {
        let c = UrgencyClassifier::default();
        let a = c.classify(Some(&condition("pneumonia", false)), 0.9, 5);
        assert_eq!(a.urgency, Urgency::High);
        assert!(a.requires_doctor);
    }

    #[test]
    fn medium_needs_both_count_and_confidence() {
        let c = UrgencyClassifier::default();
        let cold = condition("common_cold", false);
        assert_eq!(c.classify(Some(&cold), 0.66, 3).urgency, Urgency::Medium);
        assert_eq!(c.classify(Some(&cold), 0.6, 3).urgency, Urgency::Low);
        assert_eq!(c.classify(Some(&cold), 0.9, 2).urgency, Urgency::Low);
    }

    #[test]
    fn medium_does_not_call_for_doctor() {
        let c = UrgencyClassifier::default();
        let a = c.classify(Some(&condition("common_cold", false)), 0.8, 4);
        assert_eq!(a.urgency, Urgency::Medium);
        assert!(!a.requires_doctor);
    }

    #[test]
    fn static_flag_survives_low_urgency() {
        let c = UrgencyClassifier::default();
        let a = c.classify(Some(&condition("migraine", true)), 0.1, 1);
        assert_eq!(a.urgency, Urgency::Low);
        assert!(a.requires_doctor);
    }

    #[test]
    fn no_condition_is_unknown() {
        let c = UrgencyClassifier::default();
        let a = c.classify(None, 0.99, 10);
        assert_eq!(a.urgency, Urgency::Unknown);
        assert!(a.requires_doctor);
    }

    #[test]
    fn default_policy_validates_against_builtin() {
        let kb = KnowledgeBase::builtin().unwrap();
        UrgencyPolicy::default().validate(&kb).unwrap();
    }

    #[test]
    fn unknown_key_is_rejected() {
        let kb = KnowledgeBase::new(vec![condition("only", false)], BTreeMap::new()).unwrap();
        let err = UrgencyPolicy::default().validate(&kb).unwrap_err();
        assert!(matches!(err, KnowledgeError::UnknownCondition(k) if k == "appendicitis"));
        UrgencyPolicy::without_sets().validate(&kb).unwrap();
    }
}
