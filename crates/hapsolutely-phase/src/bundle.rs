//! Grouping allele records per individual.
//!
//! A [`Bundler`] walks allele records once, in input order, and yields one
//! [`Entry`] per individual as soon as the next individual starts. Records
//! are expected grouped by individual, not sorted. The bundler holds only
//! the entry being built, so very large inputs are never buffered.

use std::collections::HashSet;
use std::iter::FusedIterator;

use hapsolutely_core::Settings;
use hapsolutely_core::logging::targets;

use crate::alleles::AlleleRecord;
use crate::error::{PhaseError, Result};
use crate::sequence::Partition;

/// Both alleles of one individual, with its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub individual: String,
    pub group: String,
    /// Sequence of the first recognized allele tag.
    pub allele_a: Option<String>,
    /// Sequence of the second recognized allele tag.
    pub allele_b: Option<String>,
}

impl Entry {
    fn slot_mut(&mut self, slot: usize) -> &mut Option<String> {
        if slot == 0 {
            &mut self.allele_a
        } else {
            &mut self.allele_b
        }
    }
}

/// Lazy, single-pass grouping of allele records into [`Entry`]s.
///
/// Yields `Err` once and then ends when a record is invalid:
///
/// - [`PhaseError::UnrecognizedAllele`] for a tag other than the two
///   recognized ones
/// - [`PhaseError::DuplicateAllele`] for a tag repeated within one individual
/// - [`PhaseError::OutOfOrder`] for an individual that reappears after
///   another one
///
/// The entry of the individual at fault is never yielded. If the invalid
/// record starts a new individual, the previous, complete entry is yielded
/// before the error.
pub struct Bundler<'p, I> {
    records: I,
    partition: &'p Partition,
    tags: [String; 2],
    unknown_group: String,
    current: Option<Entry>,
    seen: HashSet<String>,
    error: Option<PhaseError>,
    finished: bool,
}

impl<'p, I> Bundler<'p, I>
where
    I: Iterator<Item = Result<AlleleRecord>>,
{
    /// Creates a bundler over `records`, assigning groups from `partition`
    /// by individual.
    pub fn new<R>(records: R, partition: &'p Partition, settings: &Settings) -> Self
    where
        R: IntoIterator<IntoIter = I>,
    {
        Self {
            records: records.into_iter(),
            partition,
            tags: settings.allele_tags.clone(),
            unknown_group: settings.unknown_group.clone(),
            current: None,
            seen: HashSet::new(),
            error: None,
            finished: false,
        }
    }

    fn slot(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }

    fn start(&mut self, record: AlleleRecord, slot: usize) -> Option<Entry> {
        let group = self
            .partition
            .get(&record.individual)
            .cloned()
            .unwrap_or_else(|| self.unknown_group.clone());
        self.seen.insert(record.individual.clone());
        let mut entry = Entry {
            individual: record.individual,
            group,
            allele_a: None,
            allele_b: None,
        };
        *entry.slot_mut(slot) = Some(record.seq);
        self.current.replace(entry)
    }

    /// Ends iteration with `error`, after yielding the previous entry if it
    /// is complete.
    fn fail(&mut self, error: PhaseError, keep_current: bool) -> Option<Result<Entry>> {
        tracing::debug!(target: targets::PHASE, %error, "bundling stopped");
        let previous = self.current.take().filter(|_| keep_current);
        match previous {
            Some(entry) => {
                self.error = Some(error);
                Some(Ok(entry))
            }
            None => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}

impl<I> Iterator for Bundler<'_, I>
where
    I: Iterator<Item = Result<AlleleRecord>>,
{
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(error) = self.error.take() {
            self.finished = true;
            return Some(Err(error));
        }

        loop {
            let record = match self.records.next() {
                None => {
                    self.finished = true;
                    return self.current.take().map(Ok);
                }
                Some(Err(error)) => return self.fail(error, false),
                Some(Ok(record)) => record,
            };

            let continues = self
                .current
                .as_ref()
                .is_some_and(|entry| entry.individual == record.individual);
            let Some(slot) = self.slot(&record.allele) else {
                let error = PhaseError::UnrecognizedAllele {
                    individual: record.individual,
                    tag: record.allele,
                };
                return self.fail(error, !continues);
            };

            if continues {
                let Some(entry) = self.current.as_mut() else {
                    continue;
                };
                let allele = entry.slot_mut(slot);
                if allele.is_some() {
                    let error = PhaseError::DuplicateAllele {
                        individual: record.individual,
                        tag: record.allele,
                    };
                    return self.fail(error, false);
                }
                *allele = Some(record.seq);
                continue;
            }

            if self.seen.contains(&record.individual) {
                let error = PhaseError::OutOfOrder {
                    individual: record.individual,
                    tag: record.allele,
                };
                return self.fail(error, true);
            }
            if let Some(done) = self.start(record, slot) {
                return Some(Ok(done));
            }
        }
    }
}

impl<I> FusedIterator for Bundler<'_, I> where I: Iterator<Item = Result<AlleleRecord>> {}

/// Bundles already parsed records.
pub fn bundle<'p, R>(
    records: R,
    partition: &'p Partition,
    settings: &Settings,
) -> Bundler<'p, std::iter::Map<R::IntoIter, fn(AlleleRecord) -> Result<AlleleRecord>>>
where
    R: IntoIterator<Item = AlleleRecord>,
{
    let parsed: fn(AlleleRecord) -> Result<AlleleRecord> = Ok;
    Bundler::new(records.into_iter().map(parsed), partition, settings)
}
