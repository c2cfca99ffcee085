use std::{fs::File, io::BufWriter, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressStyle};
use shadow_load::{
    parsers::{parser::DatasetParser, solomon::SolomonParser},
    solver::{
        moves::MoveKind,
        simulation::{SimulationParams, SimulationReport, simulate},
    },
};
use tracing::{info, warn};

use crate::{file_utils::dataset_files, parsers};

#[derive(Args)]
pub struct SimulateArgs {
    /// A dataset file, or a folder searched recursively
    #[arg(short, long)]
    dataset: PathBuf,

    /// Random moves applied by each worker
    #[arg(short, long, default_value_t = 10_000)]
    iterations: usize,

    #[arg(short, long, env = "SHADOW_LOAD_SEED", default_value_t = 2427121)]
    seed: u64,

    /// Stop each worker after this long (e.g., "30s", "5m", "PT1H30M")
    #[arg(long, value_parser = parsers::parse_duration)]
    duration: Option<jiff::SignedDuration>,

    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// Moves between two full audits, 0 to only audit the final state
    #[arg(short, long, default_value_t = 1000)]
    audit_interval: usize,

    /// Output folder for the JSON reports
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: SimulateArgs) -> Result<(), anyhow::Error> {
    let paths = dataset_files(&args.dataset)?;
    info!("Simulating {} dataset(s) from {:?}", paths.len(), args.dataset);

    let params = SimulationParams {
        iterations: args.iterations,
        seed: args.seed,
        audit_interval: args.audit_interval,
        termination: args.duration,
        workers: args.workers,
    };

    if let Some(output) = &args.output {
        std::fs::create_dir_all(output)?;
    }

    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}")?);

    for path in paths {
        bar.set_message(path.display().to_string());

        let problem = match SolomonParser.parse(&path) {
            Ok(problem) => Arc::new(problem),
            Err(error) => {
                warn!("Skipping {:?}: {}", path, error);
                bar.inc(1);
                continue;
            }
        };

        let reports = simulate(problem, &params)
            .with_context(|| format!("Simulation of {} failed", path.display()))?;

        bar.suspend(|| print_reports(&reports));

        if let Some(output) = &args.output {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("dataset"));
            let file = File::create(output.join(format!("{stem}.json")))?;
            serde_json::to_writer_pretty(BufWriter::new(file), &reports)?;
        }

        bar.inc(1);
    }

    bar.finish_and_clear();

    Ok(())
}

fn print_reports(reports: &[SimulationReport]) {
    for report in reports {
        info!(
            "{} worker {} (seed {}): {} moves, {} walk steps, {} audits in {:#}",
            report.summary.name,
            report.worker,
            report.seed,
            report.moves.total(),
            report.stats.steps,
            report.audits,
            report.elapsed,
        );
        info!(
            "Moves: {}",
            MoveKind::ALL
                .iter()
                .map(|kind| format!("{} {}", kind.name(), report.moves.get(*kind)))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec![
            "Vehicle",
            "Capacity",
            "Current demand",
            "Overload",
            "Stops",
        ]);
        for route in &report.summary.routes {
            table.add_row(vec![
                route.vehicle.to_string(),
                route.capacity.to_string(),
                route.current_demand.to_string(),
                route.overload.to_string(),
                route.stops.len().to_string(),
            ]);
        }
        println!("{table}");

        info!(
            "Unassigned stops: {}, total overload: {}",
            report.summary.unassigned.len(),
            report.summary.total_overload
        );
    }
}
