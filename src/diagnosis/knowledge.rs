use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::normalize::normalize;
use super::types::{Condition, KnowledgeError, Severity};

// ---------------------------------------------------------------------------
// AliasTable
// ---------------------------------------------------------------------------

/// Normalized surface phrase → canonical symptom name.
///
/// Every canonical symptom used by a condition is reachable through its own
/// normalized form (`runny_nose` ← `"runny nose"`), even when no explicit
/// alias lists it.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
    /// Phrases ordered by descending length, then lexicographically.
    longest_first: Vec<String>,
}

impl AliasTable {
    /// Canonical symptom for an exact normalized phrase.
    pub fn get(&self, phrase: &str) -> Option<&str> {
        self.entries.get(phrase).map(String::as_str)
    }

    /// `(phrase, canonical)` pairs, longest phrase first.
    pub fn longest_first(&self) -> impl Iterator<Item = (&str, &str)> {
        self.longest_first
            .iter()
            .filter_map(|p| self.entries.get_key_value(p))
            .map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, phrase: String, canonical: &str) -> Result<(), KnowledgeError> {
        match self.entries.get(&phrase) {
            Some(existing) if existing != canonical => Err(KnowledgeError::ConflictingAlias {
                phrase,
                first: existing.clone(),
                second: canonical.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(phrase, canonical.to_string());
                Ok(())
            }
        }
    }

    fn finish(&mut self) {
        let mut phrases: Vec<String> = self.entries.keys().cloned().collect();
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self.longest_first = phrases;
    }
}

// ---------------------------------------------------------------------------
// KnowledgeBase
// ---------------------------------------------------------------------------

/// On-disk shape of a knowledge base file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFile {
    pub conditions: Vec<Condition>,
    /// Canonical symptom → surface forms.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

/// Immutable condition table plus alias table, validated at construction.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    conditions: BTreeMap<String, Condition>,
    aliases: AliasTable,
}

impl KnowledgeBase {
    /// Build and validate a knowledge base.
    ///
    /// Fails on empty or duplicate keys, empty profiles, aliases that
    /// normalize to nothing or target a symptom no condition lists, and
    /// phrases claimed by two canonical symptoms (which would leave a
    /// condition symptom unreachable).
    pub fn new(
        conditions: Vec<Condition>,
        aliases: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, KnowledgeError> {
        let mut table = AliasTable::default();
        for (canonical, surfaces) in &aliases {
            for surface in surfaces {
                let phrase = normalize(surface);
                if phrase.is_empty() {
                    return Err(KnowledgeError::EmptyAlias {
                        alias: surface.clone(),
                        canonical: canonical.clone(),
                    });
                }
                table.insert(phrase, canonical)?;
            }
        }

        let mut by_key: BTreeMap<String, Condition> = BTreeMap::new();
        for condition in conditions {
            if condition.key.trim().is_empty() {
                return Err(KnowledgeError::EmptyKey);
            }
            if condition.symptoms.is_empty() {
                return Err(KnowledgeError::EmptyProfile(condition.key));
            }
            for symptom in &condition.symptoms {
                let phrase = normalize(symptom);
                if phrase.is_empty() {
                    return Err(KnowledgeError::InvalidSymptom {
                        condition: condition.key.clone(),
                        symptom: symptom.clone(),
                    });
                }
                table.insert(phrase, symptom)?;
            }
            if by_key.contains_key(&condition.key) {
                return Err(KnowledgeError::DuplicateCondition(condition.key));
            }
            by_key.insert(condition.key.clone(), condition);
        }

        // An alias whose target no condition lists could never score.
        let used: BTreeSet<&str> = by_key
            .values()
            .flat_map(|c| c.symptoms.iter().map(String::as_str))
            .collect();
        for (canonical, surfaces) in &aliases {
            if !used.contains(canonical.as_str()) {
                return Err(KnowledgeError::UnknownSymptom {
                    alias: surfaces.first().cloned().unwrap_or_default(),
                    canonical: canonical.clone(),
                });
            }
        }
        table.finish();

        tracing::info!(
            conditions = by_key.len(),
            aliases = table.len(),
            "Knowledge base ready"
        );

        Ok(Self {
            conditions: by_key,
            aliases: table,
        })
    }

    /// The bundled knowledge base.
    pub fn builtin() -> Result<Self, KnowledgeError> {
        let conditions = builtin_conditions();
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(canonical, surfaces)| {
                (
                    canonical.to_string(),
                    surfaces.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self::new(conditions, aliases)
    }

    /// Load a knowledge base from a JSON file (see [`KnowledgeFile`]).
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            KnowledgeError::Load(path.display().to_string(), e.to_string())
        })?;
        let file: KnowledgeFile = serde_json::from_str(&json).map_err(|e| {
            KnowledgeError::Parse(path.display().to_string(), e.to_string())
        })?;
        Self::new(file.conditions, file.aliases)
    }

    pub fn condition(&self, key: &str) -> Option<&Condition> {
        self.conditions.get(key)
    }

    /// Conditions in key order.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.values()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.conditions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }
}

// ---------------------------------------------------------------------------
// Bundled data
// ---------------------------------------------------------------------------

fn condition(
    key: &str,
    display_name: &str,
    symptoms: &[&str],
    treatment: &str,
    severity: Severity,
    requires_doctor: bool,
) -> Condition {
    Condition {
        key: key.into(),
        display_name: display_name.into(),
        symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
        treatment: treatment.into(),
        severity,
        requires_doctor,
    }
}

fn builtin_conditions() -> Vec<Condition> {
    vec![
        condition(
            "common_cold",
            "Common Cold",
            &["cough", "sneezing", "runny_nose", "sore_throat", "congestion"],
            "Rest, hydration, over-the-counter cold medication. Consult a General Physician if it persists.",
            Severity::Low,
            false,
        ),
        condition(
            "flu",
            "Influenza (Flu)",
            &["fever", "cough", "sore_throat", "body_aches", "headache", "fatigue"],
            "Rest, fluids, fever reducers; antiviral medication if started early. Consult a General Physician.",
            Severity::Medium,
            true,
        ),
        condition(
            "migraine",
            "Migraine",
            &["headache", "nausea", "sensitivity_to_light", "sensitivity_to_sound"],
            "Rest in a dark quiet room, stay hydrated, pain relievers. Consult a Neurologist.",
            Severity::Medium,
            true,
        ),
        condition(
            "gastroenteritis",
            "Gastroenteritis",
            &["nausea", "vomiting", "diarrhea", "stomach_cramps", "fever"],
            "Hydration, bland diet, rest. Consult a Gastroenterologist if symptoms persist.",
            Severity::Medium,
            false,
        ),
        condition(
            "allergies",
            "Allergic Rhinitis",
            &[
                "sneezing",
                "runny_nose",
                "congestion",
                "itchy_eyes",
                "watery_eyes",
                "itchy_throat",
            ],
            "Antihistamines, nasal sprays, avoid known triggers.",
            Severity::Low,
            false,
        ),
        condition(
            "uti",
            "Urinary Tract Infection",
            &[
                "painful_urination",
                "frequent_urination",
                "lower_abdominal_pain",
                "fever",
            ],
            "Increase water intake. Antibiotics require a prescription. Consult a Urologist.",
            Severity::High,
            true,
        ),
        condition(
            "covid19",
            "COVID-19",
            &[
                "fever",
                "dry_cough",
                "loss_of_taste",
                "loss_of_smell",
                "fatigue",
                "body_aches",
            ],
            "Isolate, rest, monitor symptoms. Consult a General Physician.",
            Severity::High,
            true,
        ),
        condition(
            "diabetes",
            "Diabetes",
            &[
                "frequent_urination",
                "excessive_thirst",
                "sudden_weight_loss",
                "fatigue",
                "blurred_vision",
            ],
            "Monitor blood sugar levels and diet. Consult an Endocrinologist.",
            Severity::Medium,
            true,
        ),
        condition(
            "asthma",
            "Asthma",
            &["shortness_of_breath", "wheezing", "chest_tightness", "cough"],
            "Use a prescribed inhaler and avoid triggers. Consult a Pulmonologist.",
            Severity::Medium,
            true,
        ),
        condition(
            "appendicitis",
            "Appendicitis",
            &[
                "lower_right_abdominal_pain",
                "severe_abdominal_pain",
                "vomiting",
                "loss_of_appetite",
                "fever",
            ],
            "This may require urgent medical evaluation. Go to the hospital immediately.",
            Severity::High,
            true,
        ),
        condition(
            "pneumonia",
            "Pneumonia",
            &[
                "cough_with_mucus",
                "fever",
                "shortness_of_breath",
                "chest_pain",
                "fatigue",
            ],
            "Medical treatment is required. Consult a Pulmonologist immediately.",
            Severity::High,
            true,
        ),
    ]
}

/// Canonical symptom → surface forms. Canonical names map to themselves
/// automatically and need not be repeated here.
const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("fever", &["temperature", "high temperature", "febrile", "feverish"]),
    ("cough", &["coughing"]),
    ("cough_with_mucus", &["wet cough", "productive cough", "phlegm", "mucus"]),
    ("sore_throat", &["throat pain", "throat soreness", "scratchy throat"]),
    ("runny_nose", &["runny-nose"]),
    ("sneezing", &["sneeze"]),
    ("congestion", &["stuffy", "stuffy nose", "blocked nose", "nasal congestion"]),
    ("headache", &["head pain", "migraine"]),
    ("nausea", &["nauseous", "nauseated", "queasy"]),
    ("vomiting", &["vomit", "throwing up"]),
    ("diarrhea", &["loose stool", "loose motion", "runny stools"]),
    ("stomach_cramps", &["abdominal cramps", "tummy cramps"]),
    (
        "painful_urination",
        &[
            "burning urine",
            "burning while urinating",
            "pain while passing urine",
            "dysuria",
        ],
    ),
    ("frequent_urination", &["urinating often", "peeing a lot"]),
    ("lower_abdominal_pain", &["lower stomach pain", "pelvic pain"]),
    (
        "lower_right_abdominal_pain",
        &["pain in lower right stomach", "right side abdominal pain"],
    ),
    ("severe_abdominal_pain", &["severe stomach pain"]),
    ("body_aches", &["body pain", "muscle pain", "aching muscles"]),
    ("fatigue", &["tired", "tiredness", "exhausted", "weakness"]),
    ("sensitivity_to_light", &["light sensitivity", "photophobia"]),
    ("sensitivity_to_sound", &["sound sensitivity", "noise sensitivity"]),
    ("loss_of_taste", &["cannot taste", "lost my taste"]),
    ("loss_of_smell", &["cannot smell", "lost my smell"]),
    (
        "shortness_of_breath",
        &[
            "breathing difficulty",
            "difficulty breathing",
            "short of breath",
            "breathless",
        ],
    ),
    ("wheezing", &["wheeze"]),
    ("chest_tightness", &["tight chest"]),
    ("excessive_thirst", &["very thirsty", "always thirsty"]),
    ("sudden_weight_loss", &["unexplained weight loss", "losing weight"]),
    ("blurred_vision", &["blurry vision"]),
    ("loss_of_appetite", &["poor appetite", "not hungry"]),
];

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn small_conditions() -> Vec<Condition> {
        vec![
            condition("alpha", "Alpha", &["fever", "rash"], "Rest.", Severity::Low, false),
            condition("beta", "Beta", &["fever", "cough"], "Fluids.", Severity::High, true),
        ]
    }

    #[test]
    fn builtin_is_valid() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(kb.len(), 11);
        assert!(kb.contains("common_cold"));
        assert!(kb.contains("appendicitis"));
    }

    #[test]
    fn every_condition_symptom_self_maps() {
        let kb = KnowledgeBase::builtin().unwrap();
        for condition in kb.conditions() {
            for symptom in &condition.symptoms {
                assert_eq!(
                    kb.aliases().get(&normalize(symptom)),
                    Some(symptom.as_str()),
                    "{} of {} does not resolve to itself",
                    symptom,
                    condition.key
                );
            }
        }
    }

    #[test]
    fn builtin_aliases_target_known_symptoms() {
        let kb = KnowledgeBase::builtin().unwrap();
        let used: BTreeSet<&str> = kb
            .conditions()
            .flat_map(|c| c.symptoms.iter().map(String::as_str))
            .collect();
        for (canonical, _) in BUILTIN_ALIASES {
            assert!(used.contains(canonical), "alias target {canonical} unused");
        }
    }

    #[test]
    fn alias_keys_are_normalized() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(kb.aliases().get("runny nose"), Some("runny_nose"));
        assert_eq!(kb.aliases().get("runny-nose"), None);
        assert_eq!(kb.aliases().get("high temperature"), Some("fever"));
    }

    #[test]
    fn longest_first_ordering() {
        let kb = KnowledgeBase::builtin().unwrap();
        let lengths: Vec<usize> = kb.aliases().longest_first().map(|(p, _)| p.len()).collect();
        assert_eq!(lengths.len(), kb.aliases().len());
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn rejects_duplicate_key() {
        let mut conditions = small_conditions();
        conditions.push(condition("alpha", "Again", &["cough"], "", Severity::Low, false));
        let err = KnowledgeBase::new(conditions, BTreeMap::new()).unwrap_err();
        assert!(matches!(err, KnowledgeError::DuplicateCondition(k) if k == "alpha"));
    }

    #[test]
    fn rejects_empty_key_and_profile() {
        let err = KnowledgeBase::new(
            vec![condition(" ", "Blank", &["fever"], "", Severity::Low, false)],
            BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, KnowledgeError::EmptyKey));

        let err = KnowledgeBase::new(
            vec![condition("empty", "Empty", &[], "", Severity::Low, false)],
            BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, KnowledgeError::EmptyProfile(k) if k == "empty"));
    }

    #[test]
    fn rejects_symptom_that_normalizes_to_nothing() {
        let err = KnowledgeBase::new(
            vec![condition("odd", "Odd", &["__"], "", Severity::Low, false)],
            BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, KnowledgeError::InvalidSymptom { .. }));
    }

    #[test]
    fn rejects_empty_alias() {
        let mut aliases = BTreeMap::new();
        aliases.insert("fever".to_string(), vec!["!!".to_string()]);
        let err = KnowledgeBase::new(small_conditions(), aliases).unwrap_err();
        assert!(matches!(err, KnowledgeError::EmptyAlias { .. }));
    }

    #[test]
    fn rejects_alias_shadowing_a_condition_symptom() {
        // "rash" is claimed by the alias table for fever, so the rash symptom
        // of alpha could never be extracted.
        let mut aliases = BTreeMap::new();
        aliases.insert("fever".to_string(), vec!["rash".to_string()]);
        let err = KnowledgeBase::new(small_conditions(), aliases).unwrap_err();
        match err {
            KnowledgeError::ConflictingAlias { phrase, first, second } => {
                assert_eq!(phrase, "rash");
                assert_eq!(first, "fever");
                assert_eq!(second, "rash");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_alias_claimed_twice() {
        let mut aliases = BTreeMap::new();
        aliases.insert("fever".to_string(), vec!["hot".to_string()]);
        aliases.insert("cough".to_string(), vec!["HOT".to_string()]);
        let err = KnowledgeBase::new(small_conditions(), aliases).unwrap_err();
        assert!(matches!(err, KnowledgeError::ConflictingAlias { .. }));
    }

    #[test]
    fn rejects_alias_targeting_unlisted_symptom() {
        // Canonical written as a phrase while the condition lists the id.
        let json = r#"{
            "conditions": [{
                "key": "common_cold",
                "display_name": "Common Cold",
                "symptoms": ["sore_throat", "cough"],
                "treatment": "Rest.",
                "severity": "low",
                "requires_doctor": false
            }],
            "aliases": {"sore throat": ["throat pain"]}
        }"#;
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(json.as_bytes()).unwrap();

        let err = KnowledgeBase::load(tmp.path()).unwrap_err();
        match err {
            KnowledgeError::UnknownSymptom { alias, canonical } => {
                assert_eq!(alias, "throat pain");
                assert_eq!(canonical, "sore throat");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_alias_for_same_canonical_is_fine() {
        let mut aliases = BTreeMap::new();
        aliases.insert(
            "fever".to_string(),
            vec!["Hot".to_string(), "hot!".to_string(), "fever".to_string()],
        );
        let kb = KnowledgeBase::new(small_conditions(), aliases).unwrap();
        assert_eq!(kb.aliases().get("hot"), Some("fever"));
    }

    #[test]
    fn load_from_json_file() {
        let file = KnowledgeFile {
            conditions: small_conditions(),
            aliases: BTreeMap::from([("cough".to_string(), vec!["hacking".to_string()])]),
        };
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(serde_json::to_string(&file).unwrap().as_bytes())
            .unwrap();

        let kb = KnowledgeBase::load(tmp.path()).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.aliases().get("hacking"), Some("cough"));
        assert_eq!(kb.condition("beta").unwrap().severity, Severity::High);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = KnowledgeBase::load(&path).unwrap_err();
        match err {
            KnowledgeError::Load(p, _) => assert!(p.ends_with("missing.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_malformed_file_is_parse_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"{\"conditions\": 42}").unwrap();
        let err = KnowledgeBase::load(tmp.path()).unwrap_err();
        assert!(matches!(err, KnowledgeError::Parse(..)));
    }
}
