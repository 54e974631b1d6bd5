use clap::Parser;
use std::path::PathBuf;

use crate::error::{CongaError, CongaResult};

/// Default neighborhood sizes, as fractions of the clone population
pub const DEFAULT_NBR_FRACS: [f64; 2] = [0.01, 0.1];

/// Nominal minimum cluster size at the reference population size
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 5;

/// Population size at which the nominal minimum cluster size applies
pub const DEFAULT_MIN_CLUSTER_SIZE_REPSIZE: usize = 5000;

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "clonograph",
    about = "Find clonotypes whose expression and receptor neighborhoods agree"
)]
pub struct Args {
    /// Clones table (tsv): clone_id, va, ja, cdr3a, vb, jb, cdr3b, gex_cluster, tcr_cluster
    #[clap(long)]
    pub clones: PathBuf,

    /// Gene-expression embedding (tsv): clone_id followed by numeric columns
    #[clap(long)]
    pub gex_embedding: PathBuf,

    /// Receptor-sequence embedding (tsv): clone_id followed by numeric columns
    #[clap(long)]
    pub tcr_embedding: PathBuf,

    /// Per-clone gene expression used for differential gene ranking
    #[clap(long)]
    pub gex_features: Option<PathBuf>,

    /// Per-clone TCR sequence scores used for differential score ranking
    #[clap(long)]
    pub tcr_scores: Option<PathBuf>,

    /// Prefix for every output file
    #[clap(long, required = true)]
    pub outfile_prefix: String,

    /// Neighborhood sizes as fractions of the population
    #[clap(long, num_args = 1.., default_values_t = DEFAULT_NBR_FRACS.to_vec())]
    pub nbr_fracs: Vec<f64>,

    /// GEX clusters to drop before analysis
    #[clap(long, num_args = 1..)]
    pub exclude_gex_clusters: Vec<u32>,

    #[clap(long, default_value_t = DEFAULT_MIN_CLUSTER_SIZE)]
    pub min_cluster_size: usize,

    #[clap(long, default_value_t = DEFAULT_MIN_CLUSTER_SIZE_REPSIZE)]
    pub min_cluster_size_repsize: usize,

    /// Seed for shuffling tied candidates during neighbor selection
    #[clap(long)]
    pub tie_seed: Option<u64>,

    #[clap(long)]
    pub find_nbrhood_overlaps: bool,

    #[clap(long)]
    pub find_tcr_nbrhood_genes: bool,

    #[clap(long)]
    pub find_tcr_cluster_genes: bool,

    /// Rank genes for the clones sharing each V and J segment gene
    #[clap(long)]
    pub find_tcr_segment_genes: bool,

    #[clap(long)]
    pub find_gex_nbrhood_scores: bool,

    #[clap(long)]
    pub find_gex_cluster_scores: bool,

    /// Re-cluster the good clones with the combined distance
    #[clap(long)]
    pub recluster_good: bool,

    /// Re-cluster all clones with the combined distance
    #[clap(long)]
    pub recluster_full: bool,
}

/// Input table locations
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub clones: PathBuf,
    pub gex_embedding: PathBuf,
    pub tcr_embedding: PathBuf,
    pub gex_features: Option<PathBuf>,
    pub tcr_scores: Option<PathBuf>,
}

/// Which analyses a run performs
#[derive(Debug, Clone, Default)]
pub struct Analyses {
    pub nbrhood_overlaps: bool,
    pub tcr_nbrhood_genes: bool,
    pub tcr_cluster_genes: bool,
    pub tcr_segment_genes: bool,
    pub gex_nbrhood_scores: bool,
    pub gex_cluster_scores: bool,
    pub recluster_good: bool,
    pub recluster_full: bool,
}

/// Validated settings for one pipeline run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub outfile_prefix: String,
    pub nbr_fracs: Vec<f64>,
    pub exclude_gex_clusters: Vec<u32>,
    pub min_cluster_size: usize,
    pub min_cluster_size_repsize: usize,
    pub tie_seed: Option<u64>,
    pub analyses: Analyses,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            outfile_prefix: "clonograph".to_string(),
            nbr_fracs: DEFAULT_NBR_FRACS.to_vec(),
            exclude_gex_clusters: Vec::new(),
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            min_cluster_size_repsize: DEFAULT_MIN_CLUSTER_SIZE_REPSIZE,
            tie_seed: None,
            analyses: Analyses::default(),
        }
    }
}

impl RunConfig {
    /// Checks the settings that would otherwise fail deep inside a run
    pub fn validate(&self) -> CongaResult<()> {
        for &frac in &self.nbr_fracs {
            check_fraction(frac)?;
        }
        Ok(())
    }
}

/// Rejects fractions outside the open interval (0, 1)
pub fn check_fraction(frac: f64) -> CongaResult<()> {
    if frac.is_finite() && frac > 0.0 && frac < 1.0 {
        Ok(())
    } else {
        Err(CongaError::InvalidFraction(frac))
    }
}

impl Args {
    pub fn input_paths(&self) -> InputPaths {
        InputPaths {
            clones: self.clones.clone(),
            gex_embedding: self.gex_embedding.clone(),
            tcr_embedding: self.tcr_embedding.clone(),
            gex_features: self.gex_features.clone(),
            tcr_scores: self.tcr_scores.clone(),
        }
    }

    pub fn run_config(&self) -> CongaResult<RunConfig> {
        let config = RunConfig {
            outfile_prefix: self.outfile_prefix.clone(),
            nbr_fracs: self.nbr_fracs.clone(),
            exclude_gex_clusters: self.exclude_gex_clusters.clone(),
            min_cluster_size: self.min_cluster_size,
            min_cluster_size_repsize: self.min_cluster_size_repsize,
            tie_seed: self.tie_seed,
            analyses: Analyses {
                nbrhood_overlaps: self.find_nbrhood_overlaps,
                tcr_nbrhood_genes: self.find_tcr_nbrhood_genes,
                tcr_cluster_genes: self.find_tcr_cluster_genes,
                tcr_segment_genes: self.find_tcr_segment_genes,
                gex_nbrhood_scores: self.find_gex_nbrhood_scores,
                gex_cluster_scores: self.find_gex_cluster_scores,
                recluster_good: self.recluster_good,
                recluster_full: self.recluster_full,
            },
        };
        config.validate()?;
        Ok(config)
    }
}
