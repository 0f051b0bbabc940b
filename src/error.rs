use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, CutError>;

/// Errors raised inside the engines. None of them escape the public
/// `solve_*` entry points; they collapse into an unfulfilled [`CutResult`].
///
/// [`CutResult`]: crate::types::CutResult
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CutError {
    /// Spec arrays of different lengths, or a negative / non-finite number.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The stock pool ran out (or nothing is long enough) before every
    /// order piece was placed.
    #[error("Stock supply insufficient: {unplaced} order piece(s) could not be placed")]
    SupplyInsufficient { unplaced: usize },

    /// A bar broke mass balance or went negative. Always a defect.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
