use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CongaError, CongaResult};

/// One representative clone per clonotype, as produced by preprocessing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneRecord {
    pub clone_id: String,
    pub va: String,
    pub ja: String,
    pub cdr3a: String,
    #[serde(default)]
    pub cdr3a_nucseq: Option<String>,
    pub vb: String,
    pub jb: String,
    pub cdr3b: String,
    #[serde(default)]
    pub cdr3b_nucseq: Option<String>,
    pub gex_cluster: u32,
    pub tcr_cluster: u32,
}

impl CloneRecord {
    /// Key identifying the alpha chain; clones with equal keys share an alpha group
    pub fn alpha_key(&self) -> String {
        chain_key(&self.va, &self.ja, &self.cdr3a, self.cdr3a_nucseq.as_deref())
    }

    /// Key identifying the beta chain; clones with equal keys share a beta group
    pub fn beta_key(&self) -> String {
        chain_key(&self.vb, &self.jb, &self.cdr3b, self.cdr3b_nucseq.as_deref())
    }
}

fn chain_key(v: &str, j: &str, cdr3: &str, nucseq: Option<&str>) -> String {
    match nucseq {
        Some(nt) if !nt.is_empty() => format!("{}|{}|{}|{}", v, j, cdr3, nt),
        _ => format!("{}|{}|{}", v, j, cdr3),
    }
}

/// The two similarity spaces every clone lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Space {
    Gex,
    Tcr,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Space::Gex => write!(f, "gex"),
            Space::Tcr => write!(f, "tcr"),
        }
    }
}

/// Dense row-major matrix with one embedding vector per clone
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    rows: usize,
    dim: usize,
    values: Vec<f64>,
}

impl Embedding {
    /// Builds an embedding from per-clone vectors, checking shape and finiteness
    ///
    /// # Arguments
    /// * `what` - Name used in error messages (e.g. "gex embedding")
    /// * `rows` - One vector per clone; all must have the same length
    ///
    /// # Returns
    /// * `Ok(Embedding)` - The packed matrix
    /// * `Err` - On ragged rows or NaN/infinite entries
    pub fn from_rows(what: &'static str, rows: Vec<Vec<f64>>) -> CongaResult<Self> {
        let dim = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut values = Vec::with_capacity(rows.len() * dim);
        for (row, vector) in rows.iter().enumerate() {
            if vector.len() != dim {
                return Err(CongaError::DimensionMismatch {
                    what,
                    row,
                    expected: dim,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(CongaError::NonFiniteValue { what, row });
            }
            values.extend_from_slice(vector);
        }
        Ok(Self {
            rows: rows.len(),
            dim,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.dim..(i + 1) * self.dim]
    }

    /// Copies the given rows, in order, into a new embedding
    pub fn subset(&self, indices: &[usize]) -> Self {
        let mut values = Vec::with_capacity(indices.len() * self.dim);
        for &i in indices {
            values.extend_from_slice(self.row(i));
        }
        Self {
            rows: indices.len(),
            dim: self.dim,
            values,
        }
    }
}

/// Named per-clone feature columns (gene expression or TCR sequence scores)
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    rows: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    pub fn new(what: &'static str, names: Vec<String>, rows: Vec<Vec<f64>>) -> CongaResult<Self> {
        let packed = Embedding::from_rows(what, rows)?;
        if packed.rows() > 0 && packed.dim() != names.len() {
            return Err(CongaError::DimensionMismatch {
                what,
                row: 0,
                expected: names.len(),
                actual: packed.dim(),
            });
        }
        Ok(Self {
            names,
            rows: packed.rows,
            values: packed.values,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn num_features(&self) -> usize {
        self.names.len()
    }

    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.values[row * self.names.len() + feature]
    }

    pub fn column(&self, feature: usize) -> Vec<f64> {
        (0..self.rows).map(|row| self.value(row, feature)).collect()
    }

    pub fn subset(&self, indices: &[usize]) -> Self {
        let width = self.names.len();
        let mut values = Vec::with_capacity(indices.len() * width);
        for &i in indices {
            values.extend_from_slice(&self.values[i * width..(i + 1) * width]);
        }
        Self {
            names: self.names.clone(),
            rows: indices.len(),
            values,
        }
    }
}

/// Everything the analysis needs about the clone population
#[derive(Debug, Clone)]
pub struct Dataset {
    pub clones: Vec<CloneRecord>,
    pub gex: Embedding,
    pub tcr: Embedding,
    pub gex_features: Option<FeatureMatrix>,
    pub tcr_scores: Option<FeatureMatrix>,
}

impl Dataset {
    /// Assembles a dataset and enforces the structural preconditions
    ///
    /// The population must be non-empty and every matrix must have exactly
    /// one row per clone.
    pub fn new(
        clones: Vec<CloneRecord>,
        gex: Embedding,
        tcr: Embedding,
        gex_features: Option<FeatureMatrix>,
        tcr_scores: Option<FeatureMatrix>,
    ) -> CongaResult<Self> {
        let n = clones.len();
        if n == 0 {
            return Err(CongaError::EmptyPopulation);
        }
        check_rows("gex embedding", n, gex.rows())?;
        check_rows("tcr embedding", n, tcr.rows())?;
        if gex.dim() == 0 || tcr.dim() == 0 {
            return Err(CongaError::DimensionMismatch {
                what: if gex.dim() == 0 {
                    "gex embedding"
                } else {
                    "tcr embedding"
                },
                row: 0,
                expected: 1,
                actual: 0,
            });
        }
        if let Some(features) = &gex_features {
            check_rows("gex features", n, features.rows())?;
        }
        if let Some(scores) = &tcr_scores {
            check_rows("tcr scores", n, scores.rows())?;
        }
        Ok(Self {
            clones,
            gex,
            tcr,
            gex_features,
            tcr_scores,
        })
    }

    pub fn len(&self) -> usize {
        self.clones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }

    pub fn embedding(&self, space: Space) -> &Embedding {
        match space {
            Space::Gex => &self.gex,
            Space::Tcr => &self.tcr,
        }
    }

    pub fn clusters(&self, space: Space) -> Vec<u32> {
        self.clones
            .iter()
            .map(|c| match space {
                Space::Gex => c.gex_cluster,
                Space::Tcr => c.tcr_cluster,
            })
            .collect()
    }

    /// Restricts every per-clone table to the given rows, in order
    pub fn subset(&self, indices: &[usize]) -> CongaResult<Self> {
        Self::new(
            indices.iter().map(|&i| self.clones[i].clone()).collect(),
            self.gex.subset(indices),
            self.tcr.subset(indices),
            self.gex_features.as_ref().map(|f| f.subset(indices)),
            self.tcr_scores.as_ref().map(|f| f.subset(indices)),
        )
    }

    /// Drops all clones whose GEX cluster is in `excluded`
    ///
    /// # Returns
    /// * The filtered dataset and the number of clones removed
    pub fn without_gex_clusters(&self, excluded: &[u32]) -> CongaResult<(Self, usize)> {
        let keep: Vec<usize> = self
            .clones
            .iter()
            .enumerate()
            .filter(|(_, c)| !excluded.contains(&c.gex_cluster))
            .map(|(i, _)| i)
            .collect();
        let removed = self.len() - keep.len();
        Ok((self.subset(&keep)?, removed))
    }
}

fn check_rows(what: &'static str, expected: usize, actual: usize) -> CongaResult<()> {
    if expected != actual {
        return Err(CongaError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
