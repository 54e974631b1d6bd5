use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::data::Dataset;
use crate::groups::ChainGroups;
use crate::overlap::{OverlapType, ScoreTriple};
use crate::recluster::ReclusterPass;
use crate::TARGET_OUTPUT;

/// `{prefix}_{stem}.tsv`
pub fn tsv_path(outfile_prefix: &str, stem: &str) -> PathBuf {
    PathBuf::from(format!("{}_{}.tsv", outfile_prefix, stem))
}

/// `{prefix}_summary.json`
pub fn summary_path(outfile_prefix: &str) -> PathBuf {
    PathBuf::from(format!("{}_summary.json", outfile_prefix))
}

/// Writes serializable records as a tab-separated table with a header row
///
/// An empty slice produces an empty file, so downstream steps can rely on
/// the artifact existing.
pub fn write_tsv<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    info!(target: TARGET_OUTPUT, "making: {} ({} rows)", path.display(), records.len());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(target: TARGET_OUTPUT, "making: {}", path.display());
    Ok(())
}

/// Column value for a re-clustering assignment: 0 outside the pass, `id + 1` inside
pub fn encode_cluster(cluster: Option<u32>) -> u32 {
    cluster.map_or(0, |c| c + 1)
}

/// Everything known about each clone at the end of a run
pub struct FinalObs<'a> {
    pub dataset: &'a Dataset,
    pub groups: &'a ChainGroups,
    pub scores: &'a [ScoreTriple],
    pub good: &'a [bool],
    pub passes: &'a [ReclusterPass],
}

impl FinalObs<'_> {
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = [
            "clone_id",
            "va",
            "ja",
            "cdr3a",
            "cdr3a_nucseq",
            "vb",
            "jb",
            "cdr3b",
            "cdr3b_nucseq",
            "gex_cluster",
            "tcr_cluster",
            "alpha_group",
            "beta_group",
            "good_score_mask",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        for overlap_type in OverlapType::ALL {
            header.push(format!("conga_score_{}", overlap_type));
        }
        for pass in self.passes {
            header.push(format!("clusters_avg_{}", pass.tag));
            header.push(format!("X_umap_avg_{}_1", pass.tag));
            header.push(format!("X_umap_avg_{}_2", pass.tag));
        }
        header
    }

    pub fn row(&self, i: usize) -> Vec<String> {
        let clone = &self.dataset.clones[i];
        let mut row = vec![
            clone.clone_id.clone(),
            clone.va.clone(),
            clone.ja.clone(),
            clone.cdr3a.clone(),
            clone.cdr3a_nucseq.clone().unwrap_or_default(),
            clone.vb.clone(),
            clone.jb.clone(),
            clone.cdr3b.clone(),
            clone.cdr3b_nucseq.clone().unwrap_or_default(),
            clone.gex_cluster.to_string(),
            clone.tcr_cluster.to_string(),
            self.groups.alpha[i].to_string(),
            self.groups.beta[i].to_string(),
            self.good[i].to_string(),
        ];
        for overlap_type in OverlapType::ALL {
            row.push(self.scores[i].get(overlap_type).to_string());
        }
        for pass in self.passes {
            let [x, y] = pass.projection[i].unwrap_or([0.0, 0.0]);
            row.push(encode_cluster(pass.clusters[i]).to_string());
            row.push(x.to_string());
            row.push(y.to_string());
        }
        row
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(self.header())?;
        for i in 0..self.dataset.len() {
            writer.write_record(self.row(i))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;
        info!(
            target: TARGET_OUTPUT,
            "making: {} ({} clones)",
            path.display(),
            self.dataset.len()
        );
        Ok(())
    }
}
