//! Batch preparation for phased sequence inputs.
//!
//! This crate checks sequence inputs before a phasing run:
//!
//! - **Reconciliation**: matching identifiers to a partition ([`Reconciler`])
//! - **Bundling**: grouping both alleles of each individual ([`Bundler`])
//! - **Scanning**: warnings about ambiguity codes and allele layout
//! - **Preparation**: the full pass over one input ([`prepare_run`])
//!
//! # Example
//!
//! ```
//! use hapsolutely_core::Settings;
//! use hapsolutely_phase::{AlleleRecord, bundle, partition_from_pairs};
//!
//! let settings = Settings::default();
//! let partition = partition_from_pairs([("X", "north")]);
//! let records = vec![
//!     AlleleRecord::new("X", "a", "ACGT"),
//!     AlleleRecord::new("X", "b", "ACGA"),
//! ];
//!
//! for entry in bundle(records, &partition, &settings) {
//!     let entry = entry.unwrap();
//!     assert_eq!(entry.group, "north");
//! }
//! ```

mod alleles;
mod bundle;
mod error;
mod prepare;
mod reconcile;
mod scan;
mod sequence;
pub mod warnings;

pub use alleles::{
    AlleleRecord, append_alleles_to_ids, check_allele_definitions, phase_partition,
    phased_fasta_warnings, records_for_input, records_from_extras, records_from_fasta_ids,
    scan_alleles, suffixed_allele_field,
};
pub use bundle::{Bundler, Entry, bundle};
pub use error::{PhaseError, Result};
pub use prepare::{PreparedRun, prepare_run};
pub use reconcile::{MatchRule, Reconciler, Reconciliation, match_tree_names};
pub use scan::scan_ambiguity;
pub use sequence::{Partition, Sequence, partition_from_pairs};
