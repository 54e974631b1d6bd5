use statrs::distribution::{ContinuousCDF, Normal};

/// Average ranks (1-based) of a sample, with the tie correction term
#[derive(Debug, Clone)]
pub struct RankedSample {
    pub ranks: Vec<f64>,
    /// Sum over tie blocks of `t^3 - t`
    pub tie_term: f64,
}

/// Ranks `values`, giving tied values the mean of the ranks they span
pub fn average_ranks(values: &[f64]) -> RankedSample {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg_rank;
        }
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }

    RankedSample { ranks, tie_term }
}

/// Outcome of one Mann-Whitney U comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannWhitneyOutcome {
    pub u: f64,
    /// Signed normal score; positive when the group ranks above the rest
    pub z: f64,
    /// Two-sided p-value
    pub pvalue: f64,
}

/// Mann-Whitney U test of `members` against every other entry of `sample`
///
/// Uses the tie-corrected normal approximation with continuity correction.
/// Returns `None` when either side is empty or all values are tied.
pub fn mann_whitney(sample: &RankedSample, members: &[usize]) -> Option<MannWhitneyOutcome> {
    let n = sample.ranks.len();
    let n1 = members.len();
    if n1 == 0 || n1 >= n {
        return None;
    }
    let n1f = n1 as f64;
    let n2f = (n - n1) as f64;
    let nf = n as f64;

    let rank_sum: f64 = members.iter().map(|&i| sample.ranks[i]).sum();
    let u = rank_sum - n1f * (n1f + 1.0) / 2.0;
    let mean = n1f * n2f / 2.0;
    let variance = n1f * n2f / 12.0 * ((nf + 1.0) - sample.tie_term / (nf * (nf - 1.0)));
    if variance <= 0.0 {
        return None;
    }

    let delta = u - mean;
    let corrected = (delta.abs() - 0.5).max(0.0) * delta.signum();
    let z = corrected / variance.sqrt();
    let pvalue = (2.0 * standard_normal().sf(z.abs())).min(1.0);

    Some(MannWhitneyOutcome { u, z, pvalue })
}

fn standard_normal() -> Normal {
    Normal::standard()
}
