use thiserror::Error;

/// Structural problems with the inputs that make a run impossible.
///
/// These are all raised before any neighborhood or overlap computation
/// starts; there is no partial-population fallback.
#[derive(Debug, Error)]
pub enum CongaError {
    #[error("Empty population: no clones to analyze")]
    EmptyPopulation,

    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Dimension mismatch in {what} at row {row}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Non-finite value in {what} at row {row}")]
    NonFiniteValue { what: &'static str, row: usize },

    #[error("Clone id mismatch in {what} at row {row}: expected {expected}, got {actual}")]
    CloneIdMismatch {
        what: String,
        row: usize,
        expected: String,
        actual: String,
    },

    #[error("Invalid neighborhood fraction {0}: must lie strictly between 0 and 1")]
    InvalidFraction(f64),

    #[error("Neighborhood of {k} is larger than the {eligible} eligible candidates of clone {entity}")]
    NeighborhoodTooLarge {
        entity: usize,
        k: usize,
        eligible: usize,
    },
}

pub type CongaResult<T> = Result<T, CongaError>;
