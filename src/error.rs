//! Insertion rejection reasons.

/// Why an insertion was refused. The list is never modified on rejection.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InsertError {
    /// NaN and the infinities cannot participate in the ordering.
    #[error("score must be finite, got {0}")]
    NonFiniteScore(f64),
    /// Members identify entries and cannot be empty.
    #[error("member must be non-empty")]
    EmptyMember,
    /// The exact (score, member) pair is already present.
    #[error("entry ({member}, {score}) is already present")]
    Duplicate { score: f64, member: String },
}
