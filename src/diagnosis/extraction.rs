use std::collections::BTreeSet;

use super::knowledge::AliasTable;
use super::lexicon::Lexicon;
use super::normalize::normalize;

/// Extract canonical symptoms from free text.
///
/// Two passes over the normalized text, unioned:
/// 1. every alias phrase (longest first) contained in the text;
/// 2. every whitespace token that is itself an alias key.
///
/// An empty set means nothing was recognized.
pub fn extract_symptoms(text: &str, aliases: &AliasTable) -> BTreeSet<String> {
    extract_with(text, aliases, None)
}

/// Like [`extract_symptoms`], with the token pass also consulting `lexicon`
/// for variant spellings.
pub fn extract_symptoms_enriched(
    text: &str,
    aliases: &AliasTable,
    lexicon: &Lexicon,
) -> BTreeSet<String> {
    extract_with(text, aliases, Some(lexicon))
}

fn extract_with(text: &str, aliases: &AliasTable, lexicon: Option<&Lexicon>) -> BTreeSet<String> {
    let normalized = normalize(text);
    let mut found = BTreeSet::new();
    if normalized.is_empty() {
        return found;
    }

    for (phrase, canonical) in aliases.longest_first() {
        if normalized.contains(phrase) {
            found.insert(canonical.to_string());
        }
    }

    for token in normalized.split(' ') {
        if let Some(canonical) = aliases.get(token) {
            found.insert(canonical.to_string());
        }
        let variant = lexicon.and_then(|l| l.standard_form(token));
        if let Some(canonical) = variant.and_then(|standard| aliases.get(standard)) {
            found.insert(canonical.to_string());
        }
    }

    found
}
