//! Synthetic row policies.
//!
//! A policy describes the rows an index proxy shows before the store rows:
//! how many there are, what each one means, and which one a fresh consumer
//! selects. The synthetic rows always form the prefix `[0, extra_rows)`.
//!
//! | policy | rows | default |
//! |--------|------|---------|
//! | `Placeholder` | placeholder | 0 |
//! | `PlaceholderWithSharedResult`, absent | placeholder | 0 |
//! | `PlaceholderWithSharedResult`, present | shared result, placeholder | 1 |
//! | `GeneratedAlternatives(n)` | alternative 0..n, placeholder | first enabled alternative |

/// A fixed "generate automatically" entry, associated with a construction
/// method of type `M`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative<M> {
    pub method: M,
    /// Human-readable method name, shown after the configured label prefix.
    pub description: String,
    /// Disabled alternatives stay in place but cannot be selected.
    pub enabled: bool,
}

impl<M> Alternative<M> {
    /// Creates an enabled alternative.
    pub fn new(method: M, description: impl Into<String>) -> Self {
        Self {
            method,
            description: description.into(),
            enabled: true,
        }
    }
}

/// What a synthetic row stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticKind {
    /// "Nothing selected".
    Placeholder,
    /// The previously computed result, shared by all observing proxies.
    SharedResult,
    /// The alternative at this position in the policy.
    GeneratedAlternative(usize),
}

/// How many synthetic rows precede the store rows, and what they mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntheticRowPolicy<M = ()> {
    /// A single placeholder row.
    Placeholder,
    /// A placeholder, preceded by the shared result while one exists.
    PlaceholderWithSharedResult,
    /// Fixed alternatives followed by a placeholder.
    GeneratedAlternatives(Vec<Alternative<M>>),
}

impl<M> SyntheticRowPolicy<M> {
    /// Whether the policy shows a shared result row while one exists.
    pub fn observes_shared_result(&self) -> bool {
        matches!(self, Self::PlaceholderWithSharedResult)
    }

    /// Number of synthetic rows, given whether a shared result exists.
    pub fn extra_rows(&self, shared_present: bool) -> usize {
        match self {
            Self::Placeholder => 1,
            Self::PlaceholderWithSharedResult => 1 + usize::from(shared_present),
            Self::GeneratedAlternatives(alternatives) => alternatives.len() + 1,
        }
    }

    /// The meaning of synthetic row `row`, or `None` past the synthetic prefix.
    pub fn kind_at(&self, row: usize, shared_present: bool) -> Option<SyntheticKind> {
        let extra = self.extra_rows(shared_present);
        if row >= extra {
            return None;
        }
        match self {
            Self::Placeholder => Some(SyntheticKind::Placeholder),
            Self::PlaceholderWithSharedResult => {
                if shared_present && row == 0 {
                    Some(SyntheticKind::SharedResult)
                } else {
                    Some(SyntheticKind::Placeholder)
                }
            }
            Self::GeneratedAlternatives(alternatives) => {
                if row < alternatives.len() {
                    Some(SyntheticKind::GeneratedAlternative(row))
                } else {
                    Some(SyntheticKind::Placeholder)
                }
            }
        }
    }

    /// The row a new or reset consumer selects.
    pub fn default_row(&self, shared_present: bool) -> usize {
        match self {
            Self::Placeholder => 0,
            Self::PlaceholderWithSharedResult => self.extra_rows(shared_present) - 1,
            Self::GeneratedAlternatives(alternatives) => alternatives
                .iter()
                .position(|alternative| alternative.enabled)
                .unwrap_or(alternatives.len()),
        }
    }

    /// The alternatives, empty for placeholder policies.
    pub fn alternatives(&self) -> &[Alternative<M>] {
        match self {
            Self::GeneratedAlternatives(alternatives) => alternatives,
            _ => &[],
        }
    }

    pub(crate) fn alternative_mut(&mut self, position: usize) -> Option<&mut Alternative<M>> {
        match self {
            Self::GeneratedAlternatives(alternatives) => alternatives.get_mut(position),
            _ => None,
        }
    }
}
