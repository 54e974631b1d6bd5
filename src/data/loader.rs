use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::info;

use super::types::{CloneRecord, Dataset, Embedding, FeatureMatrix};
use crate::config::InputPaths;
use crate::error::CongaError;
use crate::TARGET_DATA;

/// A clone-indexed numeric table: `clone_id` followed by named columns
#[derive(Debug)]
pub struct NamedMatrix {
    pub clone_ids: Vec<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Reads the clones table (one preprocessed clone per row)
pub fn read_clones(path: &Path) -> Result<Vec<CloneRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open clones file {}", path.display()))?;

    let mut clones = Vec::new();
    for (row, record) in reader.deserialize().enumerate() {
        let clone: CloneRecord = record
            .with_context(|| format!("Bad clone record at row {} of {}", row, path.display()))?;
        clones.push(clone);
    }

    info!(target: TARGET_DATA, "Read {} clones from {}", clones.len(), path.display());
    Ok(clones)
}

/// Reads a tab-separated numeric matrix whose first column is `clone_id`
pub fn read_named_matrix(path: &Path) -> Result<NamedMatrix> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open matrix file {}", path.display()))?;

    let headers = reader.headers()?.clone();
    if headers.get(0) != Some("clone_id") {
        return Err(anyhow!(
            "Matrix file {} must start with a clone_id column",
            path.display()
        ));
    }
    let columns: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();

    let mut clone_ids = Vec::new();
    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Bad row {} in {}", row, path.display()))?;
        let mut fields = record.iter();
        let clone_id = fields.next().unwrap_or_default().to_string();
        let values = fields
            .map(|field| {
                field.trim().parse::<f64>().with_context(|| {
                    format!(
                        "Non-numeric value '{}' at row {} of {}",
                        field,
                        row,
                        path.display()
                    )
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        clone_ids.push(clone_id);
        rows.push(values);
    }

    Ok(NamedMatrix {
        clone_ids,
        columns,
        rows,
    })
}

/// Loads and cross-checks all input tables into a [`Dataset`]
///
/// Every matrix must list the clones in the same order as the clones table.
///
/// # Arguments
/// * `paths` - Locations of the clones table, both embeddings and the optional feature tables
///
/// # Returns
/// * `Ok(Dataset)` - Validated dataset
/// * `Err` - If a file cannot be read or the tables disagree structurally
pub fn load_dataset(paths: &InputPaths) -> Result<Dataset> {
    let clones = read_clones(&paths.clones)?;
    let ids: Vec<&str> = clones.iter().map(|c| c.clone_id.as_str()).collect();

    let gex = read_named_matrix(&paths.gex_embedding)?;
    check_ids("gex embedding", &ids, &gex)?;
    let tcr = read_named_matrix(&paths.tcr_embedding)?;
    check_ids("tcr embedding", &ids, &tcr)?;

    let gex_features = match &paths.gex_features {
        Some(path) => {
            let matrix = read_named_matrix(path)?;
            check_ids("gex features", &ids, &matrix)?;
            Some(FeatureMatrix::new("gex features", matrix.columns, matrix.rows)?)
        }
        None => None,
    };
    let tcr_scores = match &paths.tcr_scores {
        Some(path) => {
            let matrix = read_named_matrix(path)?;
            check_ids("tcr scores", &ids, &matrix)?;
            Some(FeatureMatrix::new("tcr scores", matrix.columns, matrix.rows)?)
        }
        None => None,
    };

    let dataset = Dataset::new(
        clones,
        Embedding::from_rows("gex embedding", gex.rows)?,
        Embedding::from_rows("tcr embedding", tcr.rows)?,
        gex_features,
        tcr_scores,
    )?;

    info!(
        target: TARGET_DATA,
        "Loaded dataset: {} clones, gex dim {}, tcr dim {}",
        dataset.len(),
        dataset.gex.dim(),
        dataset.tcr.dim()
    );
    Ok(dataset)
}

fn check_ids(what: &str, expected: &[&str], matrix: &NamedMatrix) -> Result<()> {
    if matrix.clone_ids.len() != expected.len() {
        return Err(CongaError::LengthMismatch {
            what: "clone rows",
            expected: expected.len(),
            actual: matrix.clone_ids.len(),
        })
        .with_context(|| format!("while reading {}", what));
    }
    for (row, (want, got)) in expected.iter().zip(&matrix.clone_ids).enumerate() {
        if *want != got {
            return Err(CongaError::CloneIdMismatch {
                what: what.to_string(),
                row,
                expected: want.to_string(),
                actual: got.clone(),
            }
            .into());
        }
    }
    Ok(())
}
