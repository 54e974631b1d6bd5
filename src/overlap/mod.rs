// Module declarations
pub mod scorer;
pub mod significance;
pub mod types;

pub use scorer::{floor_score, score_overlaps, OverlapResults, ScoreAccumulator, OVERLAP_PVAL_THRESHOLD};
pub use significance::{HypergeometricOverlap, OverlapTest};
pub use types::*;
