use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use clonograph::config::{Analyses, InputPaths, RunConfig};
use clonograph::data::load_dataset;
use clonograph::output::{summary_path, tsv_path};
use clonograph::pipeline::{run, Collaborators};
use clonograph::CongaError;

const NUM_BLOBS: usize = 4;
const BLOB_SIZE: usize = 30;

/// Four blobs that agree between the two spaces, with independent noise in each
fn write_inputs(dir: &Path, seed: u64) -> InputPaths {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = NUM_BLOBS * BLOB_SIZE;

    let mut clones = String::from("clone_id\tva\tja\tcdr3a\tvb\tjb\tcdr3b\tgex_cluster\ttcr_cluster\n");
    let mut gex = String::from("clone_id\tpc1\tpc2\tpc3\n");
    let mut tcr = String::from("clone_id\tpc1\tpc2\n");
    let mut genes = String::from("clone_id\tgene0\tgene1\tgene2\n");
    let mut scores = String::from("clone_id\tcdr3_len\tcharge\n");

    for i in 0..n {
        let blob = i / BLOB_SIZE;
        let center = 20.0 * blob as f64;
        // clones 0 and 1 share an alpha chain
        let cdr3a = if i == 1 { "CAV0".to_string() } else { format!("CAV{}", i) };
        writeln!(
            clones,
            "clone{i}\tTRAV1\tTRAJ1\t{cdr3a}\tTRBV{b}\tTRBJ1\tCASS{i}\t{blob}\t{blob}",
            b = blob + 1
        )
        .unwrap();

        let mut noise = || rng.random_range(-1.0..1.0);
        writeln!(gex, "clone{i}\t{}\t{}\t{}", center + noise(), noise(), noise()).unwrap();
        writeln!(tcr, "clone{i}\t{}\t{}", noise(), center + noise()).unwrap();

        let marker = if blob == 0 { 5.0 } else { 0.0 };
        writeln!(genes, "clone{i}\t{}\t{}\t{}", marker + noise(), noise(), noise()).unwrap();
        writeln!(scores, "clone{i}\t{}\t{}", blob as f64 + noise(), noise()).unwrap();
    }

    let files = [
        ("clones.tsv", clones),
        ("gex.tsv", gex),
        ("tcr.tsv", tcr),
        ("genes.tsv", genes),
        ("scores.tsv", scores),
    ];
    for (name, content) in &files {
        fs::write(dir.join(name), content).unwrap();
    }

    InputPaths {
        clones: dir.join("clones.tsv"),
        gex_embedding: dir.join("gex.tsv"),
        tcr_embedding: dir.join("tcr.tsv"),
        gex_features: Some(dir.join("genes.tsv")),
        tcr_scores: Some(dir.join("scores.tsv")),
    }
}

fn full_config(prefix: &str) -> RunConfig {
    RunConfig {
        outfile_prefix: prefix.to_string(),
        nbr_fracs: vec![0.1],
        analyses: Analyses {
            nbrhood_overlaps: true,
            tcr_nbrhood_genes: true,
            tcr_cluster_genes: true,
            tcr_segment_genes: true,
            gex_nbrhood_scores: true,
            gex_cluster_scores: true,
            recluster_good: true,
            recluster_full: true,
        },
        ..RunConfig::default()
    }
}

fn read_table(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split('\t').map(|s| s.to_string()).collect())
        .collect()
}

#[test]
fn test_end_to_end_run_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), 7);
    let prefix = dir.path().join("conga").display().to_string();

    let dataset = load_dataset(&paths).unwrap();
    let summary = run(&full_config(&prefix), dataset, &Collaborators::default()).unwrap();

    assert_eq!(summary.num_clones, NUM_BLOBS * BLOB_SIZE);
    assert!(summary.num_good > 0);
    assert_eq!(summary.min_cluster_size, 5);
    assert!(!summary.good_cluster_pairs.is_empty());
    // the only clusters are the blobs, and both spaces agree on them
    assert!(summary
        .good_cluster_pairs
        .iter()
        .all(|p| p.gex_cluster == p.tcr_cluster && p.count >= 5));

    for stem in [
        "cluster_interactions",
        "graph_graph_overlaps",
        "good_cluster_pairs",
        "tcr_nbrhood_genes",
        "tcr_cluster_genes",
        "tcr_segment_genes",
        "gex_nbrhood_scores",
        "gex_cluster_scores",
        "good_cluster_pair_genes",
        "good_cluster_pair_tcr_scores",
        "final_obs",
    ] {
        assert!(tsv_path(&prefix, stem).exists(), "missing {}", stem);
    }
    assert!(summary_path(&prefix).exists());

    let overlaps = read_table(&tsv_path(&prefix, "graph_graph_overlaps"));
    for column in ["clone_id", "conga_score", "nbr_frac", "overlap_type", "gex_cluster", "cdr3b"] {
        assert!(overlaps[0].iter().any(|h| h == column), "missing column {}", column);
    }
    let score_column = overlaps[0].iter().position(|h| h == "conga_score").unwrap();
    for row in &overlaps[1..] {
        let score: f64 = row[score_column].parse().unwrap();
        assert!(score > 0.0 && score <= 1.0);
    }

    let final_obs = read_table(&tsv_path(&prefix, "final_obs"));
    assert_eq!(final_obs.len(), NUM_BLOBS * BLOB_SIZE + 1);
    for column in [
        "good_score_mask",
        "conga_score_nbr_nbr",
        "conga_score_cluster_nbr",
        "conga_score_nbr_cluster",
        "clusters_avg_good",
        "clusters_avg_full",
        "X_umap_avg_good_1",
        "X_umap_avg_full_2",
    ] {
        assert!(final_obs[0].iter().any(|h| h == column), "missing column {}", column);
    }
    let alpha = final_obs[0].iter().position(|h| h == "alpha_group").unwrap();
    assert_eq!(final_obs[1][alpha], final_obs[2][alpha]);
    assert_ne!(final_obs[1][alpha], final_obs[3][alpha]);

    // the marker gene separates blob 0 from the rest
    let pair_genes = read_table(&tsv_path(&prefix, "good_cluster_pair_genes"));
    let group = pair_genes[0].iter().position(|h| h == "group").unwrap();
    let feature = pair_genes[0].iter().position(|h| h == "feature").unwrap();
    assert!(pair_genes[1..]
        .iter()
        .any(|row| row[group] == "0_0" && row[feature] == "gene0"));

    // blob 0 is the only clone family using TRBV1
    let segment_genes = read_table(&tsv_path(&prefix, "tcr_segment_genes"));
    let analysis = segment_genes[0].iter().position(|h| h == "analysis").unwrap();
    let group = segment_genes[0].iter().position(|h| h == "group").unwrap();
    let feature = segment_genes[0].iter().position(|h| h == "feature").unwrap();
    assert!(segment_genes[1..].iter().any(|row| {
        row[analysis] == "tcr_segment_genes_vb" && row[group] == "TRBV1" && row[feature] == "gene0"
    }));
    // every clone uses TRAV1, which leaves no outside group to compare against
    assert!(segment_genes[1..]
        .iter()
        .all(|row| row[analysis] != "tcr_segment_genes_va"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(summary_path(&prefix)).unwrap()).unwrap();
    assert_eq!(json["num_clones"], 120);
    assert_eq!(json["recluster_passes"].as_array().unwrap().len(), 2);
}

#[test]
fn test_runs_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), 11);
    let first = dir.path().join("first").display().to_string();
    let second = dir.path().join("second").display().to_string();

    run(&full_config(&first), load_dataset(&paths).unwrap(), &Collaborators::default()).unwrap();
    run(&full_config(&second), load_dataset(&paths).unwrap(), &Collaborators::default()).unwrap();

    for stem in ["graph_graph_overlaps", "final_obs", "good_cluster_pairs"] {
        assert_eq!(
            fs::read_to_string(tsv_path(&first, stem)).unwrap(),
            fs::read_to_string(tsv_path(&second, stem)).unwrap(),
            "{} differs between runs",
            stem
        );
    }
}

#[test]
fn test_mismatched_clone_ids_fail_before_scoring() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), 3);
    let tcr = fs::read_to_string(&paths.tcr_embedding)
        .unwrap()
        .replacen("clone5\t", "clone_x\t", 1);
    fs::write(&paths.tcr_embedding, tcr).unwrap();

    let err = load_dataset(&paths).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CongaError>(),
        Some(CongaError::CloneIdMismatch { row: 5, .. })
    ));
}
