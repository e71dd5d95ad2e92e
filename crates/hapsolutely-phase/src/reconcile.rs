//! Matching individuals against a partition.
//!
//! Sequence sets and partitions often disagree about allele suffixes: the
//! sequences may be named `ind_a`/`ind_b` while the partition lists `ind`,
//! or the other way round. Each identifier is tried against the partition
//! under these rules, in order, stopping at the first that finds a
//! non-empty group:
//!
//! 1. the identifier as is
//! 2. the identifier without its last character (`inda` -> `ind`)
//! 3. the identifier without its last `_` segment (`ind_allele1` -> `ind`)
//! 4. the identifier suffixed with its own allele field (`ind` -> `ind_a`)
//!
//! Identifiers matching no rule get the unknown group and are reported in a
//! single truncated warning.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use hapsolutely_core::Settings;
use hapsolutely_core::logging::targets;
use hapsolutely_model::FileInfo;

use crate::sequence::{Partition, Sequence};
use crate::warnings;

/// The rule that matched an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRule {
    Exact,
    StrippedAllele,
    StrippedSegment,
    AlleleSuffixed,
}

/// Output of [`Reconciler::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciliation {
    /// Group of every individual, unknown ones included.
    pub groups: Partition,
    /// Individuals that matched no rule, in first-seen order.
    pub unresolved: Vec<String>,
    pub warnings: Vec<String>,
}

/// Matches sequence identifiers against a partition.
#[derive(Debug, Clone)]
pub struct Reconciler {
    strip_suffixes: bool,
    allele_field: Option<String>,
    unknown_group: String,
    preview: usize,
}

impl Reconciler {
    /// A reconciler applying every rule, reading alleles from the configured
    /// allele field.
    pub fn new(settings: &Settings) -> Self {
        Self {
            strip_suffixes: true,
            allele_field: Some(settings.allele_field.clone()),
            unknown_group: settings.unknown_group.clone(),
            preview: settings.warning_preview,
        }
    }

    /// A reconciler for sequences read from `input`.
    ///
    /// Suffix stripping (rules 2 and 3) only applies to phased inputs, and
    /// re-suffixing (rule 4) only to inputs with an allele column, whose
    /// header names the field.
    pub fn for_input(input: &FileInfo, settings: &Settings) -> Self {
        Self {
            strip_suffixes: input.is_phased,
            allele_field: input.allele_header().map(str::to_string),
            ..Self::new(settings)
        }
    }

    /// Stops trying rule 4, for identifiers that already end with their
    /// allele.
    pub fn without_allele_field(mut self) -> Self {
        self.allele_field = None;
        self
    }

    /// Finds the group of one identifier.
    pub fn match_id<'p>(
        &self,
        id: &str,
        extras: &BTreeMap<String, String>,
        partition: &'p Partition,
    ) -> Option<(MatchRule, &'p str)> {
        let lookup = |key: &str| {
            partition
                .get(key)
                .filter(|group| !group.is_empty())
                .map(String::as_str)
        };

        if let Some(group) = lookup(id) {
            return Some((MatchRule::Exact, group));
        }
        if self.strip_suffixes {
            if let Some(group) = lookup(strip_last_char(id)) {
                return Some((MatchRule::StrippedAllele, group));
            }
            if let Some(group) = lookup(strip_last_segment(id)) {
                return Some((MatchRule::StrippedSegment, group));
            }
        }
        let allele = self
            .allele_field
            .as_deref()
            .and_then(|field| extras.get(field))?;
        lookup(&format!("{id}_{allele}")).map(|group| (MatchRule::AlleleSuffixed, group))
    }

    /// Assigns a group to every sequence identifier.
    pub fn reconcile(&self, sequences: &[Sequence], partition: &Partition) -> Reconciliation {
        let mut result = Reconciliation::default();
        let mut seen_unresolved = HashSet::new();

        for sequence in sequences {
            let group = match self.match_id(&sequence.id, &sequence.extras, partition) {
                Some((rule, group)) => {
                    tracing::trace!(target: targets::PHASE, id = %sequence.id, ?rule, group, "matched");
                    group.to_string()
                }
                None => {
                    if seen_unresolved.insert(sequence.id.as_str()) {
                        result.unresolved.push(sequence.id.clone());
                    }
                    self.unknown_group.clone()
                }
            };
            result.groups.insert(sequence.id.clone(), group);
        }

        if let Some(warning) = warnings::listing(
            "Could not match ",
            "individual",
            " to partition",
            &result.unresolved,
            self.preview,
        ) {
            tracing::warn!(
                target: targets::PHASE,
                unresolved = result.unresolved.len(),
                "individuals missing from partition"
            );
            result.warnings.push(warning);
        }
        result
    }
}

/// Reports sequence identifiers that are not node names of a tree.
pub fn match_tree_names(
    sequences: &[Sequence],
    names: &BTreeSet<String>,
    settings: &Settings,
) -> Vec<String> {
    let unknowns: Vec<&str> = sequences
        .iter()
        .map(|sequence| sequence.id.as_str())
        .filter(|id| !names.contains(*id))
        .collect();
    if unknowns.is_empty() {
        return Vec::new();
    }
    vec![format!(
        "Could not match individuals to tree: {}",
        warnings::quoted_preview(&unknowns, settings.warning_preview)
    )]
}

fn strip_last_char(id: &str) -> &str {
    id.char_indices().last().map_or(id, |(at, _)| &id[..at])
}

fn strip_last_segment(id: &str) -> &str {
    id.rsplit_once('_').map_or("", |(head, _)| head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::partition_from_pairs;

    fn ids(ids: &[&str]) -> Vec<Sequence> {
        ids.iter().map(|id| Sequence::new(*id, "ACGT")).collect()
    }

    #[test]
    fn test_strip_helpers() {
        assert_eq!(strip_last_char("inda"), "ind");
        assert_eq!(strip_last_char("x"), "");
        assert_eq!(strip_last_char(""), "");
        assert_eq!(strip_last_segment("ind_1_a"), "ind_1");
        assert_eq!(strip_last_segment("ind"), "");
    }

    #[test]
    fn test_rules_in_order() {
        let settings = Settings::default();
        let reconciler = Reconciler::new(&settings);
        let partition = partition_from_pairs([
            ("exact", "A"),
            ("stripped", "B"),
            ("segment", "C"),
            ("suffixed_a", "D"),
        ]);
        let sequences = vec![
            Sequence::new("exact", ""),
            Sequence::new("strippedb", ""),
            Sequence::new("segment_allele1", ""),
            Sequence::new("suffixed", "").with_extra("allele", "a"),
            Sequence::new("missing", ""),
        ];

        let rules: Vec<_> = sequences
            .iter()
            .map(|s| reconciler.match_id(&s.id, &s.extras, &partition).map(|m| m.0))
            .collect();
        assert_eq!(
            rules,
            vec![
                Some(MatchRule::Exact),
                Some(MatchRule::StrippedAllele),
                Some(MatchRule::StrippedSegment),
                Some(MatchRule::AlleleSuffixed),
                None,
            ]
        );

        let result = reconciler.reconcile(&sequences, &partition);
        assert_eq!(result.groups["strippedb"], "B");
        assert_eq!(result.groups["missing"], "unknown");
        assert_eq!(result.unresolved, vec!["missing"]);
        assert_eq!(
            result.warnings,
            vec!["Could not match individual to partition: 'missing'"]
        );
    }

    #[test]
    fn test_stripped_allele_beats_stripped_segment() {
        let reconciler = Reconciler::new(&Settings::default());
        let partition = partition_from_pairs([("ind_", "by char"), ("ind", "by segment")]);

        let result = reconciler.reconcile(&ids(&["ind_a"]), &partition);
        assert_eq!(result.groups["ind_a"], "by char");
    }

    #[test]
    fn test_empty_group_is_a_miss() {
        let reconciler = Reconciler::new(&Settings::default());
        let partition = partition_from_pairs([("inda", ""), ("ind", "G")]);

        let result = reconciler.reconcile(&ids(&["inda"]), &partition);
        assert_eq!(result.groups["inda"], "G");
    }

    #[test]
    fn test_warning_truncates_after_three() {
        let reconciler = Reconciler::new(&Settings::default());
        let result = reconciler.reconcile(
            &ids(&["v", "w", "x", "y", "z", "w"]),
            &Partition::new(),
        );

        assert_eq!(result.unresolved, vec!["v", "w", "x", "y", "z"]);
        assert_eq!(
            result.warnings,
            vec!["Could not match individuals to partition: 'v', 'w', 'x' and 2 more"]
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let reconciler = Reconciler::new(&Settings::default());
        let partition = partition_from_pairs([("a", "G1"), ("b", "G2")]);
        let sequences = ids(&["a_1", "b_2", "q", "r", "a", "s", "t"]);

        let first = reconciler.reconcile(&sequences, &partition);
        let second = reconciler.reconcile(&sequences, &partition);
        assert_eq!(first, second);
    }

    #[test]
    fn test_for_input_narrows_rules() {
        let settings = Settings::default();
        let partition = partition_from_pairs([("ind", "G"), ("sample_a", "H")]);

        let unphased = Reconciler::for_input(&FileInfo::fasta("in.fas"), &settings);
        assert_eq!(unphased.match_id("inda", &BTreeMap::new(), &partition), None);

        let phased = Reconciler::for_input(&FileInfo::fasta("in.fas").phased(true), &settings);
        assert_eq!(
            phased.match_id("inda", &BTreeMap::new(), &partition),
            Some((MatchRule::StrippedAllele, "G"))
        );

        let headers = vec!["id".to_string(), "seq".to_string(), "hap".to_string()];
        let tabular = FileInfo::tabfile("in.tsv", headers, "id", "seq", "hap");
        let reconciler = Reconciler::for_input(&tabular, &settings);
        let sequence = Sequence::new("sample", "").with_extra("hap", "a");
        assert_eq!(
            reconciler.match_id(&sequence.id, &sequence.extras, &partition),
            Some((MatchRule::AlleleSuffixed, "H"))
        );
    }

    #[test]
    fn test_tree_names() {
        let settings = Settings::default();
        let names: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();

        assert!(match_tree_names(&ids(&["a", "b"]), &names, &settings).is_empty());
        assert_eq!(
            match_tree_names(&ids(&["a", "c"]), &names, &settings),
            vec!["Could not match individuals to tree: 'c'"]
        );
    }
}
