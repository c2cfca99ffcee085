use std::path::PathBuf;

use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};
use shadow_load::parsers::{parser::DatasetParser, solomon::SolomonParser};
use tracing::info;

#[derive(Args)]
pub struct InspectArgs {
    /// The dataset file to import
    #[arg(short, long)]
    dataset: PathBuf,
}

pub fn run(args: InspectArgs) -> Result<(), anyhow::Error> {
    info!("Inspecting dataset {:?}", args.dataset);
    let problem = SolomonParser.parse(&args.dataset)?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["", "Value"]);
    table.add_row(vec![String::from("Name"), problem.name().to_owned()]);
    table.add_row(vec![
        String::from("Depots"),
        problem
            .depots()
            .iter()
            .map(|depot| depot.external_id().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    ]);
    table.add_row(vec![
        String::from("Vehicles"),
        problem.vehicles().len().to_string(),
    ]);
    table.add_row(vec![
        String::from("Total capacity"),
        problem.total_capacity().to_string(),
    ]);
    table.add_row(vec![String::from("Stops"), problem.stops().len().to_string()]);
    table.add_row(vec![
        String::from("Total demand"),
        problem.total_demand().to_string(),
    ]);
    table.add_row(vec![
        String::from("Clamped due times"),
        problem.warnings().len().to_string(),
    ]);
    println!("{table}");

    if !problem.warnings().is_empty() {
        let mut warnings = Table::new();
        warnings
            .load_preset(UTF8_FULL)
            .set_header(vec!["Stop", "Due time", "Clamped to"]);
        for warning in problem.warnings() {
            warnings.add_row(vec![
                warning.stop_external_id.to_string(),
                format!("{:#}", warning.correction.original),
                format!("{:#}", warning.correction.corrected),
            ]);
        }
        println!("{warnings}");
    }

    Ok(())
}
