use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use debris_transfer_calculator::config::{RunConfig, load_run_config};
use debris_transfer_calculator::export::summary::{RunSummary, summary_path, write_summary};
use debris_transfer_calculator::export::table::write_table_to_path;
use debris_transfer_calculator::importer::{read_catalog, states};
use debris_transfer_calculator::transfer::{GridCoordinate, GridSearch, TransferOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Minimum delta-v transfers between every pair of objects of a debris cluster"
)]
struct Cli {
    /// Dataset name; the catalog is read from `<data-dir>/<CLUSTER>.tle`
    #[arg(default_value = "cosmos-1408")]
    cluster: String,

    /// Directory holding the TLE catalogs
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory receiving `<CLUSTER>.csv` and its JSON summary
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Run configuration (TOML or YAML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_run_config(path)
            .with_context(|| format!("invalid configuration {}", path.display()))?,
        None => RunConfig::default(),
    };

    let input = cli.data_dir.join(format!("{}.tle", cli.cluster));
    let catalog = read_catalog(&input)?;
    let objects = states(&catalog);

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let search = GridSearch::from_config(&config);
    let total = search.spec().count(objects.len());
    info!(
        "{} objects, {} epochs of {:.2} days, transfers of {}..={} epochs",
        objects.len(),
        config.epochs,
        config.epoch_length_days(),
        config.transfer_min,
        config.transfer_max
    );

    let progress = progress_bar(total)?;
    let report = search.run_with_observer(
        &objects,
        &cancel,
        &|_: &GridCoordinate, _: &TransferOutcome| progress.inc(1),
    )?;
    progress.finish_and_clear();

    if report.interrupted {
        warn!(
            "interrupted after {} of {} grid points; writing partial results",
            report.evaluated, report.total
        );
    }

    let output = cli.output_dir.join(format!("{}.csv", cli.cluster));
    write_table_to_path(&output, &report.table.rows())?;
    info!(
        "output written to {} ({} transfers)",
        output.display(),
        report.converged
    );

    let summary = RunSummary {
        dataset: cli.cluster.clone(),
        objects: objects.len(),
        grid_points: report.total,
        evaluated: report.evaluated,
        converged: report.converged,
        failed: report.failed,
        interrupted: report.interrupted,
        elapsed_s: report.elapsed.as_secs_f64(),
        config,
    };
    let summary_file = summary_path(&cli.output_dir, &cli.cluster);
    write_summary(&summary_file, &summary)?;
    info!("summary written to {}", summary_file.display());

    Ok(())
}

fn init_logging() {
    let filters = std::env::var("DEBRIS_LOG").unwrap_or_else(|_| "info".to_string());
    // A logger may already be installed; keep it.
    let _ = pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .try_init();
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:60.cyan/blue} {pos:>7}/{len:7} {msg}")?
            .progress_chars("##-"),
    );
    Ok(pb)
}
