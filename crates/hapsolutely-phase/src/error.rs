//! Error types for batch preparation.
//!
//! Every variant is fatal for the current run: the input does not follow the
//! allele conventions it claims to follow.

/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, PhaseError>;

/// Errors that abort a batch run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    /// An allele tag is neither of the two recognized tags.
    #[error("Individual '{individual}' has unrecognized allele '{tag}'. Is the input phased?")]
    UnrecognizedAllele { individual: String, tag: String },

    /// The same allele appears twice for one individual.
    #[error("Duplicate allele entry for individual '{individual}' and allele '{tag}'")]
    DuplicateAllele { individual: String, tag: String },

    /// An individual's records are interrupted by another individual.
    #[error("Out of order definition: '{individual}', '{tag}'")]
    OutOfOrder { individual: String, tag: String },

    /// The identifier has no `<individual>_<allele>` form.
    #[error("Could not parse allele for identifier: '{id}'")]
    UnparsableAllele { id: String },

    /// A tabular record has no value in the allele column.
    #[error("Sequence '{id}' has no '{field}' field")]
    MissingAlleleField { id: String, field: String },
}

impl PhaseError {
    /// Create an unrecognized allele error.
    pub fn unrecognized(individual: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::UnrecognizedAllele {
            individual: individual.into(),
            tag: tag.into(),
        }
    }

    /// The individual or identifier the error is about.
    pub fn identifier(&self) -> &str {
        match self {
            Self::UnrecognizedAllele { individual, .. }
            | Self::DuplicateAllele { individual, .. }
            | Self::OutOfOrder { individual, .. } => individual,
            Self::UnparsableAllele { id } | Self::MissingAlleleField { id, .. } => id,
        }
    }
}
