//! Allele records and the checks run on phased inputs.
//!
//! Phased inputs carry two records per individual. FASTA files encode the
//! allele in the identifier (`ind_a`, `ind_b`); tabular files keep it in a
//! separate column. Both are turned into [`AlleleRecord`]s.

use std::collections::{BTreeSet, HashMap, HashSet};

use hapsolutely_core::Settings;
use hapsolutely_model::{FileFormat, FileInfo};

use crate::error::{PhaseError, Result};
use crate::sequence::{Partition, Sequence};
use crate::warnings::{self, quote, quoted_preview};

/// One allele of one individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleRecord {
    pub individual: String,
    pub allele: String,
    pub seq: String,
}

impl AlleleRecord {
    pub fn new(
        individual: impl Into<String>,
        allele: impl Into<String>,
        seq: impl Into<String>,
    ) -> Self {
        Self {
            individual: individual.into(),
            allele: allele.into(),
            seq: seq.into(),
        }
    }
}

/// Splits FASTA identifiers at their last `_` into individual and allele.
pub fn records_from_fasta_ids<'a, I>(sequences: I) -> impl Iterator<Item = Result<AlleleRecord>> + 'a
where
    I: IntoIterator<Item = &'a Sequence>,
    I::IntoIter: 'a,
{
    sequences.into_iter().map(|sequence| {
        match sequence.id.rsplit_once('_') {
            Some((individual, allele)) if !individual.is_empty() => {
                Ok(AlleleRecord::new(individual, allele, sequence.seq.as_str()))
            }
            _ => Err(PhaseError::UnparsableAllele {
                id: sequence.id.clone(),
            }),
        }
    })
}

/// Reads alleles from the `field` extra of tabular records.
pub fn records_from_extras<'a, I>(
    sequences: I,
    field: &'a str,
) -> impl Iterator<Item = Result<AlleleRecord>> + 'a
where
    I: IntoIterator<Item = &'a Sequence>,
    I::IntoIter: 'a,
{
    sequences.into_iter().map(move |sequence| -> Result<AlleleRecord> {
        let allele = sequence
            .extra(field)
            .ok_or_else(|| PhaseError::MissingAlleleField {
                id: sequence.id.clone(),
                field: field.to_string(),
            })?;
        Ok(AlleleRecord::new(
            sequence.id.as_str(),
            allele,
            sequence.seq.as_str(),
        ))
    })
}

/// Reads the allele records of a phased input.
///
/// Returns `None` for unphased inputs and formats without sequences.
pub fn records_for_input(
    input: &FileInfo,
    sequences: &[Sequence],
) -> Option<Result<Vec<AlleleRecord>>> {
    if !input.is_phased {
        return None;
    }
    match input.format {
        FileFormat::Fasta => Some(records_from_fasta_ids(sequences).collect()),
        FileFormat::Tabfile => {
            let field = input.allele_header()?;
            Some(records_from_extras(sequences, field).collect())
        }
        _ => None,
    }
}

/// Checks that each individual's alleles are distinct and contiguous.
pub fn check_allele_definitions(records: &[AlleleRecord]) -> Result<()> {
    let mut previous: Option<&str> = None;
    let mut alleles: HashSet<&str> = HashSet::new();
    let mut individuals: HashSet<&str> = HashSet::new();

    for record in records {
        let individual = record.individual.as_str();
        let allele = record.allele.as_str();
        if previous == Some(individual) {
            if alleles.contains(allele) {
                return Err(PhaseError::DuplicateAllele {
                    individual: individual.to_string(),
                    tag: allele.to_string(),
                });
            }
        } else {
            alleles.clear();
            if individuals.contains(individual) {
                return Err(PhaseError::OutOfOrder {
                    individual: individual.to_string(),
                    tag: allele.to_string(),
                });
            }
        }
        previous = Some(individual);
        alleles.insert(allele);
        individuals.insert(individual);
    }
    Ok(())
}

/// Warnings about unexpected allele tags and individuals with too few or
/// too many alleles.
pub fn scan_alleles(records: &[AlleleRecord], settings: &Settings) -> Vec<String> {
    let mut unexpected = BTreeSet::new();
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        if settings.allele_slot(&record.allele).is_none() {
            unexpected.insert(record.allele.as_str());
        }
        let count = counts.entry(record.individual.as_str()).or_insert_with(|| {
            order.push(record.individual.as_str());
            0
        });
        *count += 1;
    }

    let mut warns = Vec::new();
    if !unexpected.is_empty() {
        let [first, second] = &settings.allele_tags;
        let listed = unexpected.iter().map(|tag| quote(tag)).collect::<Vec<_>>();
        warns.push(format!(
            "Unexpected alleles (not {} or {}): {}",
            quote(first),
            quote(second),
            listed.join(", ")
        ));
    }

    let with_count = |keep: fn(usize) -> bool| {
        order
            .iter()
            .copied()
            .filter(|individual| counts.get(individual).copied().is_some_and(keep))
            .collect::<Vec<&str>>()
    };
    let preview = settings.warning_preview;
    warns.extend(warnings::listing(
        "Only a single allele defined for ",
        "individual",
        "",
        &with_count(|count| count == 1),
        preview,
    ));
    warns.extend(warnings::listing(
        "More than two alleles defined for ",
        "individual",
        "",
        &with_count(|count| count > 2),
        preview,
    ));
    warns
}

/// The allele column whose values [`append_alleles_to_ids`] appends, if
/// `input` is a tabular file with one.
pub fn suffixed_allele_field(input: &FileInfo) -> Option<&str> {
    if input.format != FileFormat::Tabfile {
        return None;
    }
    input.allele_header()
}

/// Suffixes the identifiers of a phased tabular input with their allele.
///
/// Other inputs are returned unchanged. Warns about allele tags longer than
/// one character.
pub fn append_alleles_to_ids(
    input: &FileInfo,
    sequences: Vec<Sequence>,
    settings: &Settings,
) -> Result<(Vec<Sequence>, Vec<String>)> {
    let Some(field) = suffixed_allele_field(input) else {
        return Ok((sequences, Vec::new()));
    };

    let mut long_alleles = BTreeSet::new();
    let sequences = sequences
        .into_iter()
        .map(|mut sequence| -> Result<Sequence> {
            let allele = sequence
                .extra(field)
                .ok_or_else(|| PhaseError::MissingAlleleField {
                    id: sequence.id.clone(),
                    field: field.to_string(),
                })?
                .to_string();
            if allele.chars().count() > 1 {
                long_alleles.insert(allele.clone());
            }
            sequence.id = format!("{}_{allele}", sequence.id);
            Ok(sequence)
        })
        .collect::<Result<Vec<_>>>()?;

    let long_alleles: Vec<String> = long_alleles.into_iter().collect();
    let warns = if long_alleles.is_empty() {
        Vec::new()
    } else {
        vec![format!(
            "Allele identifiers should be one character long: {}",
            quoted_preview(&long_alleles, settings.warning_preview)
        )]
    };
    Ok((sequences, warns))
}

/// Duplicates every partition entry for both allele tags (`ind` becomes
/// `inda` and `indb`).
pub fn phase_partition(partition: &Partition, settings: &Settings) -> Partition {
    partition
        .iter()
        .flat_map(|(individual, group)| {
            settings
                .allele_tags
                .iter()
                .map(move |tag| (format!("{individual}{tag}"), group.clone()))
        })
        .collect()
}

/// Checks that the identifiers of a phased FASTA input end with `_<allele>`
/// and come in matching pairs.
///
/// Returns at most one warning, for the first problem found.
pub fn phased_fasta_warnings(sequences: &[Sequence]) -> Vec<String> {
    if let Some(sequence) = sequences
        .iter()
        .find(|sequence| sequence.id.chars().rev().nth(1) != Some('_'))
    {
        return vec![format!(
            "Sequence identifier(s) not ending with allele: {} instead of {}",
            quote(&sequence.id),
            quote(&format!("{}_a", sequence.id))
        )];
    }

    for pair in sequences.chunks_exact(2) {
        let [a, b] = pair else { continue };
        if strip_chars(&a.id, 2) != strip_chars(&b.id, 2) {
            return vec![format!(
                "Mismatched pair identifiers for phased input: {}, {}",
                quote(&a.id),
                quote(&b.id)
            )];
        }
    }
    Vec::new()
}

fn strip_chars(text: &str, count: usize) -> &str {
    text.char_indices()
        .rev()
        .nth(count - 1)
        .map_or("", |(at, _)| &text[..at])
}
