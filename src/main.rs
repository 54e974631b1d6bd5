use anyhow::{Context, Result};
use clap::Parser;
use prettytable::{Cell, Row as PrettyRow, Table};
use tracing::info;

use clonograph::config::Args;
use clonograph::data::load_dataset;
use clonograph::logging::configure_logging;
use clonograph::pipeline::{run, Collaborators, RunSummary};
use clonograph::TARGET_DATA;

fn main() -> Result<()> {
    let args = Args::parse();
    configure_logging(&args.outfile_prefix)?;

    let config = args.run_config().context("Invalid command line")?;
    let paths = args.input_paths();
    info!(target: TARGET_DATA, "Loading clones from {}", paths.clones.display());
    let dataset = load_dataset(&paths)?;

    let summary = run(&config, dataset, &Collaborators::default())?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{} clones, {} good (min cluster size {})",
        summary.num_clones, summary.num_good, summary.min_cluster_size
    );

    if summary.good_cluster_pairs.is_empty() {
        println!("No good cluster pairs.");
    } else {
        let mut table = Table::new();
        table.add_row(PrettyRow::new(vec![
            Cell::new("GEX cluster"),
            Cell::new("TCR cluster"),
            Cell::new("Good clones"),
        ]));
        for pair in &summary.good_cluster_pairs {
            table.add_row(PrettyRow::new(vec![
                Cell::new(&pair.gex_cluster.to_string()),
                Cell::new(&pair.tcr_cluster.to_string()),
                Cell::new(&pair.count.to_string()),
            ]));
        }
        table.printstd();
    }

    for pass in &summary.recluster_passes {
        println!(
            "re-clustered {}: {} clones in {} clusters, {} with enough good clones",
            pass.tag, pass.subset_size, pass.num_clusters, pass.num_good_clusters
        );
    }
}
