use std::fmt;

use crate::distance::DistanceMatrix;

/// Why a combined distance could not be formed
#[derive(Debug, Clone, PartialEq)]
pub enum DegenerateSubset {
    TooSmall(usize),
    SizeMismatch { gex: usize, tcr: usize },
    ZeroMedian { space: &'static str, median: f64 },
}

impl fmt::Display for DegenerateSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateSubset::TooSmall(size) => {
                write!(f, "subset of {} clones is too small to re-cluster", size)
            }
            DegenerateSubset::SizeMismatch { gex, tcr } => {
                write!(f, "gex distances cover {} clones but tcr distances cover {}", gex, tcr)
            }
            DegenerateSubset::ZeroMedian { space, median } => {
                write!(f, "{} distances have unusable median {}", space, median)
            }
        }
    }
}

/// Median-normalized quadrature sum of the two distance matrices
///
/// `sqrt((gex / median(gex))^2 + (tcr / median(tcr))^2)`, so neither space
/// dominates because of its scale.
pub fn combined_distance(
    gex: &DistanceMatrix,
    tcr: &DistanceMatrix,
) -> Result<DistanceMatrix, DegenerateSubset> {
    if gex.size() != tcr.size() {
        return Err(DegenerateSubset::SizeMismatch {
            gex: gex.size(),
            tcr: tcr.size(),
        });
    }
    if gex.size() < 2 {
        return Err(DegenerateSubset::TooSmall(gex.size()));
    }
    let gex_median = usable_median("gex", gex)?;
    let tcr_median = usable_median("tcr", tcr)?;

    Ok(gex.zip_map(tcr, |g, t| {
        let g = g / gex_median;
        let t = t / tcr_median;
        (g * g + t * t).sqrt()
    }))
}

fn usable_median(space: &'static str, matrix: &DistanceMatrix) -> Result<f64, DegenerateSubset> {
    match matrix.median() {
        Some(median) if median.is_finite() && median > 0.0 => Ok(median),
        other => Err(DegenerateSubset::ZeroMedian {
            space,
            median: other.unwrap_or(0.0),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Embedding;
    use crate::distance::pairwise_euclidean;

    #[test]
    fn test_identical_spaces_scale_by_sqrt2() {
        let embedding = Embedding::from_rows(
            "test",
            vec![vec![0.0, 0.0], vec![1.0, 2.0], vec![4.0, 0.5], vec![2.0, 2.0]],
        )
        .unwrap();
        let d = pairwise_euclidean(&embedding);
        let combined = combined_distance(&d, &d).unwrap();
        let median = d.median().unwrap();

        for i in 0..4 {
            for j in 0..4 {
                let want = d.get(i, j) / median * 2f64.sqrt();
                assert!((combined.get(i, j) - want).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_degenerate_subsets_are_rejected() {
        let single = DistanceMatrix::from_values(1, vec![0.0]).unwrap();
        assert_eq!(
            combined_distance(&single, &single),
            Err(DegenerateSubset::TooSmall(1))
        );

        // three identical points: every distance, hence the median, is zero
        let zeros = DistanceMatrix::from_values(3, vec![0.0; 9]).unwrap();
        let ok = DistanceMatrix::from_values(3, vec![0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0])
            .unwrap();
        assert!(matches!(
            combined_distance(&zeros, &ok),
            Err(DegenerateSubset::ZeroMedian { space: "gex", .. })
        ));
        assert!(matches!(
            combined_distance(&ok, &zeros),
            Err(DegenerateSubset::ZeroMedian { space: "tcr", .. })
        ));

        let pair = DistanceMatrix::from_values(2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        assert_eq!(
            combined_distance(&ok, &pair),
            Err(DegenerateSubset::SizeMismatch { gex: 3, tcr: 2 })
        );
    }
}
