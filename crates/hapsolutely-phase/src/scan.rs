//! Sequence content checks.

use std::collections::BTreeSet;

use hapsolutely_core::Settings;

use crate::sequence::Sequence;

/// Warns about sequence characters outside the configured alphabet.
///
/// Gaps (`-`) and missing data (`?`) are never reported. Letters are
/// compared case-insensitively and reported upper case, sorted.
pub fn scan_ambiguity(sequences: &[Sequence], settings: &Settings) -> Vec<String> {
    let alphabet: BTreeSet<char> = settings
        .ambiguity_alphabet
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .chain(['-', '?'])
        .collect();

    let codes: BTreeSet<char> = sequences
        .iter()
        .flat_map(|sequence| sequence.seq.chars())
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| !c.is_whitespace() && !alphabet.contains(c))
        .collect();

    if codes.is_empty() {
        return Vec::new();
    }
    let codes: String = codes.into_iter().collect();
    vec![format!("Ambiguity codes detected: '{codes}'")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_sequences() {
        let sequences = vec![Sequence::new("a", "ACGT-?acgt")];
        assert!(scan_ambiguity(&sequences, &Settings::default()).is_empty());
    }

    #[test]
    fn test_codes_sorted_and_deduplicated() {
        let sequences = vec![Sequence::new("a", "ACRT"), Sequence::new("b", "nAr")];
        assert_eq!(
            scan_ambiguity(&sequences, &Settings::default()),
            vec!["Ambiguity codes detected: 'NR'"]
        );
    }

    #[test]
    fn test_custom_alphabet() {
        let settings = Settings {
            ambiguity_alphabet: "ACGTN".to_string(),
            ..Settings::default()
        };
        let sequences = vec![Sequence::new("a", "ACGTN")];
        assert!(scan_ambiguity(&sequences, &settings).is_empty());
    }
}
