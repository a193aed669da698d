//! Optional token-variant lexicon (misspellings, regional spellings).
//!
//! The lexicon only adds recall to the extractor's token pass. When it is
//! unavailable the extractor behaves exactly as without it, so loading is
//! best-effort: a missing or broken file is logged and the lexicon is
//! switched off instead of failing startup.

use std::collections::HashMap;
use std::path::Path;

use super::knowledge::AliasTable;
use super::normalize::normalize;

/// Variant → standard form. Standard forms are alias-table phrases.
const BUILTIN_VARIANTS: &[(&str, &str)] = &[
    ("diarrhoea", "diarrhea"),
    ("diarhea", "diarrhea"),
    ("diarrea", "diarrhea"),
    ("headach", "headache"),
    ("hedache", "headache"),
    ("feaver", "fever"),
    ("fevre", "fever"),
    ("nausia", "nausea"),
    ("vommiting", "vomiting"),
    ("vomitting", "vomiting"),
    ("sneezin", "sneezing"),
    ("coughin", "coughing"),
    ("wheezin", "wheezing"),
    ("throwup", "throwing up"),
    ("sorethroat", "sore throat"),
    ("runnynose", "runny nose"),
    ("tiered", "tired"),
];

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    variants: HashMap<String, String>,
    available: bool,
}

impl Lexicon {
    /// The bundled variant table.
    pub fn builtin() -> Self {
        Self {
            variants: BUILTIN_VARIANTS
                .iter()
                .map(|(v, s)| (v.to_string(), s.to_string()))
                .collect(),
            available: true,
        }
    }

    /// A lexicon that never contributes.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Bundled table extended with a JSON `{variant: standard}` file.
    ///
    /// Never fails: an unreadable or malformed file yields an unavailable
    /// lexicon and a warning.
    pub fn load_optional(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Lexicon not loaded, continuing without it");
                return Self::unavailable();
            }
        };
        let extra: HashMap<String, String> = match serde_json::from_str(&json) {
            Ok(extra) => extra,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Lexicon file malformed, continuing without it");
                return Self::unavailable();
            }
        };

        let mut lexicon = Self::builtin();
        let mut skipped = 0usize;
        for (variant, standard) in extra {
            let variant = normalize(&variant);
            let standard = normalize(&standard);
            // Only single tokens can be looked up by the token pass.
            if variant.is_empty() || standard.is_empty() || variant.contains(' ') {
                skipped += 1;
                continue;
            }
            lexicon.variants.insert(variant, standard);
        }
        if skipped > 0 {
            tracing::warn!(path = %path.display(), skipped, "Lexicon entries skipped");
        }
        tracing::info!(path = %path.display(), entries = lexicon.variants.len(), "Lexicon loaded");
        lexicon
    }

    /// Capability flag.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Standard form for a normalized token, if the lexicon knows one.
    pub fn standard_form(&self, token: &str) -> Option<&str> {
        if !self.available {
            return None;
        }
        self.variants.get(token).map(String::as_str)
    }

    /// Variants whose standard form no alias phrase resolves, sorted.
    /// These can never contribute a symptom.
    pub fn unreachable_variants(&self, aliases: &AliasTable) -> Vec<&str> {
        let mut dead: Vec<&str> = self
            .variants
            .iter()
            .filter(|(_, standard)| aliases.get(standard).is_none())
            .map(|(variant, _)| variant.as_str())
            .collect();
        dead.sort_unstable();
        dead
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::diagnosis::knowledge::KnowledgeBase;

    #[test]
    fn builtin_resolves_variants() {
        let lexicon = Lexicon::builtin();
        assert!(lexicon.is_available());
        assert_eq!(lexicon.standard_form("diarrhoea"), Some("diarrhea"));
        assert_eq!(lexicon.standard_form("sorethroat"), Some("sore throat"));
        assert_eq!(lexicon.standard_form("fever"), None);
    }

    #[test]
    fn unavailable_never_contributes() {
        let lexicon = Lexicon::unavailable();
        assert!(!lexicon.is_available());
        assert_eq!(lexicon.standard_form("diarrhoea"), None);
    }

    #[test]
    fn missing_file_is_unavailable_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let lexicon = Lexicon::load_optional(&dir.path().join("nope.json"));
        assert!(!lexicon.is_available());
    }

    #[test]
    fn malformed_file_is_unavailable() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"[1, 2, 3]").unwrap();
        let lexicon = Lexicon::load_optional(tmp.path());
        assert!(!lexicon.is_available());
    }

    #[test]
    fn file_extends_builtin_and_normalizes() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(br#"{"Coff": "Cough", "two words": "fever", "empty": "!!"}"#)
            .unwrap();
        let lexicon = Lexicon::load_optional(tmp.path());
        assert!(lexicon.is_available());
        assert_eq!(lexicon.standard_form("coff"), Some("cough"));
        assert_eq!(lexicon.standard_form("diarrhoea"), Some("diarrhea"));
        assert_eq!(lexicon.standard_form("two words"), None);
        assert_eq!(lexicon.standard_form("empty"), None);
        assert_eq!(lexicon.len(), BUILTIN_VARIANTS.len() + 1);
    }

    #[test]
    fn builtin_variants_all_reach_a_symptom() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert!(Lexicon::builtin().unreachable_variants(kb.aliases()).is_empty());
    }

    #[test]
    fn file_variant_without_known_standard_is_reported() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(br#"{"coff": "cof", "feverr": "fever"}"#).unwrap();
        let lexicon = Lexicon::load_optional(tmp.path());
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(lexicon.unreachable_variants(kb.aliases()), vec!["coff"]);
    }
}
