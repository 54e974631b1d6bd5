use serde::Serialize;
use std::fmt;

use crate::data::CloneRecord;

/// The three ways the GEX and TCR spaces are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OverlapType {
    /// GEX neighbors against TCR neighbors
    NbrNbr,
    /// GEX cluster against TCR neighbors
    ClusterNbr,
    /// GEX neighbors against TCR cluster
    NbrCluster,
}

impl OverlapType {
    pub const ALL: [OverlapType; 3] = [
        OverlapType::NbrNbr,
        OverlapType::ClusterNbr,
        OverlapType::NbrCluster,
    ];

    /// Column of this overlap type in a [`ScoreTriple`]
    pub fn column(self) -> usize {
        match self {
            OverlapType::NbrNbr => 0,
            OverlapType::ClusterNbr => 1,
            OverlapType::NbrCluster => 2,
        }
    }
}

impl fmt::Display for OverlapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapType::NbrNbr => write!(f, "nbr_nbr"),
            OverlapType::ClusterNbr => write!(f, "cluster_nbr"),
            OverlapType::NbrCluster => write!(f, "nbr_cluster"),
        }
    }
}

/// One result row from an overlap significance test
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapRow {
    pub clone_index: usize,
    /// Population-scaled p-value in (0, 1]
    pub conga_score: f64,
    /// `-log10(conga_score)`, exact even where `conga_score` bottoms out at
    /// `f64::MIN_POSITIVE`
    pub significance: f64,
    pub overlap: usize,
    pub expected_overlap: f64,
    /// Size of the tested neighbor set
    pub nbr_size: usize,
    /// Size of the set it was compared against (neighbors or cluster-mates)
    pub reference_size: usize,
    /// Eligible clones in the null model
    pub population: usize,
}

impl OverlapRow {
    /// Signed overlap magnitude: observed minus expected
    pub fn excess(&self) -> f64 {
        self.overlap as f64 - self.expected_overlap
    }
}

/// Per-clone maximal significance, ordered `[nbr_nbr, cluster_nbr, nbr_cluster]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreTriple(pub [f64; 3]);

impl ScoreTriple {
    pub fn get(&self, overlap_type: OverlapType) -> f64 {
        self.0[overlap_type.column()]
    }

    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Long-form overlap result tagged with the run parameters and clone metadata
#[derive(Debug, Clone, Serialize)]
pub struct OverlapRecord {
    pub clone_index: usize,
    pub clone_id: String,
    pub conga_score: f64,
    pub significance: f64,
    pub overlap: usize,
    pub expected_overlap: f64,
    pub overlap_excess: f64,
    pub nbr_size: usize,
    pub reference_size: usize,
    pub population: usize,
    pub nbr_frac: f64,
    pub overlap_type: String,
    pub gex_cluster: u32,
    pub tcr_cluster: u32,
    pub va: String,
    pub ja: String,
    pub cdr3a: String,
    pub vb: String,
    pub jb: String,
    pub cdr3b: String,
}

impl OverlapRecord {
    pub fn new(
        row: &OverlapRow,
        clone: &CloneRecord,
        nbr_frac: f64,
        overlap_type: OverlapType,
    ) -> Self {
        Self {
            clone_index: row.clone_index,
            clone_id: clone.clone_id.clone(),
            conga_score: row.conga_score,
            significance: row.significance,
            overlap: row.overlap,
            expected_overlap: row.expected_overlap,
            overlap_excess: row.excess(),
            nbr_size: row.nbr_size,
            reference_size: row.reference_size,
            population: row.population,
            nbr_frac,
            overlap_type: overlap_type.to_string(),
            gex_cluster: clone.gex_cluster,
            tcr_cluster: clone.tcr_cluster,
            va: clone.va.clone(),
            ja: clone.ja.clone(),
            cdr3a: clone.cdr3a.clone(),
            vb: clone.vb.clone(),
            jb: clone.jb.clone(),
            cdr3b: clone.cdr3b.clone(),
        }
    }
}
