use nalgebra::{DMatrix, SymmetricEigen};

use crate::distance::DistanceMatrix;

/// Eigenvalues below this fraction of the largest are treated as zero
const EIGENVALUE_CUTOFF: f64 = 1e-12;

/// Two-dimensional classical MDS layout of a distance matrix
///
/// Double-centres the squared distances and scales the eigenvectors of the
/// two largest eigenvalues by their square roots. Axes with non-positive
/// eigenvalues collapse to zero.
pub fn classical_mds(distances: &DistanceMatrix) -> Vec<[f64; 2]> {
    let n = distances.size();
    if n == 0 {
        return Vec::new();
    }
    let eigen = SymmetricEigen::new(double_centered(distances));

    // nalgebra does not order the eigenvalues
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
    let largest = eigen.eigenvalues[order[0]].max(0.0);

    let mut coords = vec![[0.0; 2]; n];
    for (axis, &index) in order.iter().take(2).enumerate() {
        let value = eigen.eigenvalues[index];
        if value <= largest * EIGENVALUE_CUTOFF || value <= 0.0 {
            break;
        }
        let scale = value.sqrt();
        for (coord, v) in coords.iter_mut().zip(eigen.eigenvectors.column(index).iter()) {
            coord[axis] = v * scale;
        }
    }
    coords
}

fn double_centered(distances: &DistanceMatrix) -> DMatrix<f64> {
    let n = distances.size();
    let squared = DMatrix::from_fn(n, n, |i, j| {
        let d = distances.get(i, j);
        d * d
    });
    let row_means: Vec<f64> = squared.row_iter().map(|row| row.sum() / n as f64).collect();
    let grand_mean = row_means.iter().sum::<f64>() / n as f64;

    DMatrix::from_fn(n, n, |i, j| {
        -0.5 * (squared[(i, j)] - row_means[i] - row_means[j] + grand_mean)
    })
}
