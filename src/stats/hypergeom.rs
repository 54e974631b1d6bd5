use statrs::function::factorial::ln_binomial;

/// P(X >= observed) for X ~ Hypergeometric(population, successes, draws)
///
/// Underflows to 0 for tails below `f64::MIN_POSITIVE`; use [`ln_upper_tail`]
/// when the magnitude matters.
pub fn upper_tail(population: u64, successes: u64, draws: u64, observed: u64) -> f64 {
    ln_upper_tail(population, successes, draws, observed).exp().min(1.0)
}

/// Natural log of [`upper_tail`], summed in log space so it stays finite
/// for tails far below the smallest representable `f64`
pub fn ln_upper_tail(population: u64, successes: u64, draws: u64, observed: u64) -> f64 {
    let successes = successes.min(population);
    let draws = draws.min(population);
    let lowest = (draws + successes).saturating_sub(population);
    let highest = successes.min(draws);

    if observed > highest {
        return f64::NEG_INFINITY;
    }
    if observed <= lowest {
        return 0.0;
    }

    let ln_total = ln_binomial(population, draws);
    let terms: Vec<f64> = (observed..=highest)
        .map(|i| {
            ln_binomial(successes, i) + ln_binomial(population - successes, draws - i) - ln_total
        })
        .collect();

    log_sum_exp(&terms).min(0.0)
}

/// Mean of Hypergeometric(population, successes, draws)
pub fn expected_overlap(population: u64, successes: u64, draws: u64) -> f64 {
    if population == 0 {
        0.0
    } else {
        draws as f64 * successes as f64 / population as f64
    }
}

fn log_sum_exp(terms: &[f64]) -> f64 {
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + terms.iter().map(|t| (t - max).exp()).sum::<f64>().ln()
}
