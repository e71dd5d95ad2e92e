//! The preparation pass run before a batch.
//!
//! [`prepare_run`] checks one input against a partition and gathers every
//! warning the user should see before the batch proceeds. Problems that make
//! the input unusable are returned as errors instead.

use std::collections::BTreeSet;

use hapsolutely_core::logging::targets;
use hapsolutely_core::{PerfSpan, Settings};
use hapsolutely_model::{FileFormat, FileInfo};

use crate::alleles::{
    AlleleRecord, append_alleles_to_ids, check_allele_definitions, phased_fasta_warnings,
    records_for_input, scan_alleles, suffixed_allele_field,
};
use crate::bundle::{Entry, bundle};
use crate::error::Result;
use crate::reconcile::{Reconciler, match_tree_names};
use crate::scan::scan_ambiguity;
use crate::sequence::{Partition, Sequence};

/// A checked batch input.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    /// Input sequences, identifiers suffixed with their allele for phased
    /// tabular inputs.
    pub sequences: Vec<Sequence>,
    /// Allele records of a phased input, `None` for unphased inputs.
    pub records: Option<Vec<AlleleRecord>>,
    /// Group of every sequence identifier.
    pub partition: Partition,
    /// Group of every individual named by `records`.
    pub individuals: Partition,
    /// Warnings in the order they are shown.
    pub warnings: Vec<String>,
    pub seconds_taken: f64,
}

impl PreparedRun {
    /// Adds a warning for sequences that are not nodes of `names`.
    pub fn check_tree(&mut self, names: &BTreeSet<String>, settings: &Settings) {
        self.warnings
            .extend(match_tree_names(&self.sequences, names, settings));
    }

    /// Bundles the allele records per individual, one entry at a time.
    ///
    /// Returns `None` for unphased inputs.
    pub fn entries<'a>(
        &'a self,
        settings: &Settings,
    ) -> Option<impl Iterator<Item = Result<Entry>> + use<'a>> {
        let records = self.records.as_ref()?;
        Some(bundle(records.iter().cloned(), &self.individuals, settings))
    }
}

/// Checks `sequences` read from `input` against `partition`.
///
/// Warnings are gathered in this order: ambiguity codes, phased identifier
/// layout, allele definitions, partition matching.
pub fn prepare_run(
    input: &FileInfo,
    sequences: Vec<Sequence>,
    partition: &Partition,
    settings: &Settings,
) -> Result<PreparedRun> {
    let span = PerfSpan::new("prepare_run");
    let mut warnings = scan_ambiguity(&sequences, settings);

    if input.is_phased && input.format == FileFormat::Fasta {
        warnings.extend(phased_fasta_warnings(&sequences));
    }

    let records = records_for_input(input, &sequences).transpose()?;
    if let Some(records) = &records {
        check_allele_definitions(records)?;
        warnings.extend(scan_alleles(records, settings));
    }

    let (sequences, allele_warnings) = append_alleles_to_ids(input, sequences, settings)?;
    warnings.extend(allele_warnings);

    let mut reconciler = Reconciler::for_input(input, settings);
    if suffixed_allele_field(input).is_some() {
        reconciler = reconciler.without_allele_field();
    }
    let reconciliation = reconciler.reconcile(&sequences, partition);
    warnings.extend(reconciliation.warnings);

    // Records follow their sequences one to one.
    let mut individuals = Partition::new();
    for (record, sequence) in records.iter().flatten().zip(&sequences) {
        let Some(group) = reconciliation.groups.get(&sequence.id) else {
            continue;
        };
        let known = individuals
            .get(&record.individual)
            .is_some_and(|current| *current != settings.unknown_group);
        if !known {
            individuals.insert(record.individual.clone(), group.clone());
        }
    }

    let seconds_taken = span.elapsed_secs();
    tracing::info!(
        target: targets::PHASE,
        input = %input.file_name(),
        sequences = sequences.len(),
        warnings = warnings.len(),
        seconds_taken,
        "batch prepared"
    );

    Ok(PreparedRun {
        sequences,
        records,
        partition: reconciliation.groups,
        individuals,
        warnings,
        seconds_taken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhaseError;
    use crate::sequence::partition_from_pairs;

    #[test]
    fn test_unphased_fasta() {
        let settings = Settings::default();
        let partition = partition_from_pairs([("x", "G")]);
        let sequences = vec![Sequence::new("x", "ACGT"), Sequence::new("y", "ACNT")];

        let run = prepare_run(&FileInfo::fasta("in.fas"), sequences, &partition, &settings).unwrap();
        assert!(run.records.is_none());
        assert!(run.entries(&settings).is_none());
        assert_eq!(run.partition["y"], "unknown");
        assert_eq!(
            run.warnings,
            vec![
                "Ambiguity codes detected: 'N'".to_string(),
                "Could not match individual to partition: 'y'".to_string(),
            ]
        );
    }

    #[test]
    fn test_phased_fasta_bundles() {
        let settings = Settings::default();
        let partition = partition_from_pairs([("x", "G")]);
        let sequences = vec![
            Sequence::new("x_a", "AC"),
            Sequence::new("x_b", "AG"),
        ];

        let input = FileInfo::fasta("in.fas").phased(true);
        let run = prepare_run(&input, sequences, &partition, &settings).unwrap();
        assert!(run.warnings.is_empty(), "{:?}", run.warnings);
        assert_eq!(run.partition["x_a"], "G");

        let entries: Vec<_> = run
            .entries(&settings)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].group, "G");
        assert_eq!(entries[0].allele_b.as_deref(), Some("AG"));
    }

    #[test]
    fn test_individual_group_from_allele_keyed_partition() {
        let settings = Settings::default();
        let partition = partition_from_pairs([("x_a", "G"), ("x_b", "G")]);
        let sequences = vec![Sequence::new("x_a", "AC"), Sequence::new("x_b", "AG")];

        let input = FileInfo::fasta("in.fas").phased(true);
        let run = prepare_run(&input, sequences, &partition, &settings).unwrap();
        assert!(run.warnings.is_empty(), "{:?}", run.warnings);
        assert_eq!(run.individuals["x"], "G");

        let mut entries = run.entries(&settings).unwrap();
        assert_eq!(entries.next().unwrap().unwrap().group, "G");
        assert!(entries.next().is_none());
    }

    #[test]
    fn test_suffixed_tab_ids_skip_allele_rule() {
        let settings = Settings::default();
        let headers = ["id", "allele", "seq"].map(str::to_string).to_vec();
        let input = FileInfo::tabfile("in.tsv", headers, "id", "seq", "allele");
        let sequences = vec![
            Sequence::new("x", "AC").with_extra("allele", "a"),
            Sequence::new("x", "AG").with_extra("allele", "b"),
        ];
        // Only reachable by appending the allele a second time.
        let partition = partition_from_pairs([("x_a_a", "wrong"), ("x_b_b", "wrong")]);

        let run = prepare_run(&input, sequences, &partition, &settings).unwrap();
        assert_eq!(run.partition["x_a"], "unknown");
        assert_eq!(run.individuals["x"], "unknown");
        assert_eq!(
            run.warnings,
            vec!["Could not match individuals to partition: 'x_a', 'x_b'"]
        );
    }

    #[test]
    fn test_out_of_order_is_fatal() {
        let settings = Settings::default();
        let sequences = vec![
            Sequence::new("x_a", "AC"),
            Sequence::new("y_a", "AC"),
            Sequence::new("x_b", "AC"),
        ];

        let input = FileInfo::fasta("in.fas").phased(true);
        let err = prepare_run(&input, sequences, &Partition::new(), &settings).unwrap_err();
        assert!(matches!(err, PhaseError::OutOfOrder { .. }));
    }

    #[test]
    fn test_tree_check_appends() {
        let settings = Settings::default();
        let mut run = prepare_run(
            &FileInfo::fasta("in.fas"),
            vec![Sequence::new("x", "ACGT")],
            &partition_from_pairs([("x", "G")]),
            &settings,
        )
        .unwrap();

        run.check_tree(&BTreeSet::new(), &settings);
        assert_eq!(run.warnings, vec!["Could not match individuals to tree: 'x'"]);
    }
}
