//! Statistical primitives behind the default overlap and rank tests.

pub mod hypergeom;
pub mod rank;

pub use hypergeom::{expected_overlap, ln_upper_tail, upper_tail};
pub use rank::{average_ranks, mann_whitney, MannWhitneyOutcome, RankedSample};

/// Bonferroni-style scaling of a p-value, capped at 1
pub fn scale_pvalue(pvalue: f64, num_tests: usize) -> f64 {
    (pvalue * num_tests as f64).min(1.0)
}

/// `-log10(p)`, the significance score used throughout
pub fn neg_log10(pvalue: f64) -> f64 {
    -pvalue.log10()
}

/// `-log10(p)` from `ln(p)`, for p-values too small to hold in an `f64`
pub fn neg_log10_from_ln(ln_pvalue: f64) -> f64 {
    -ln_pvalue / std::f64::consts::LN_10
}
