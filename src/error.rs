//! Error types for the scenario algebra.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AlgebraError>;

/// Errors that abort an algebra call.
///
/// Per-scenario numeric gaps (a year that cannot be interpolated, a missing
/// metadata value) are deliberately NOT errors: they surface as NaN so that a
/// batch selection over hundreds of scenarios is never aborted by one bad row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgebraError {
    /// Mutually exclusive construction arguments were both supplied, or neither.
    #[error("Argument conflict: {0}")]
    ArgumentConflict(String),

    /// Arithmetic between Vars whose index dimensions neither match nor nest.
    #[error("Index dimensions {left:?} not compatible with {right:?}")]
    DimensionIncompatible { left: Vec<String>, right: Vec<String> },

    /// Arithmetic between Vars whose year-selector sets neither match nor
    /// reduce to one-vs-many.
    #[error("Year selectors of left var ({left:?}) not compatible with ({right:?})")]
    SelectorIncompatible { left: Vec<String>, right: Vec<String> },

    /// A selection filter referenced a column outside the metadata schema.
    #[error("'{0}' is not an existing column in the metadata")]
    UnknownMetadataColumn(String),

    /// A selection filter referenced a pathway code outside the registry.
    #[error("'{code}' is not a valid {registry} [{valid}]")]
    UnknownPathwayCode { registry: &'static str, code: String, valid: String },

    /// The derive builder found none of its source variables in the ledger.
    #[error("None of the source variables {0:?} exist in the ledger")]
    MissingSourceVariable(Vec<String>),
}
