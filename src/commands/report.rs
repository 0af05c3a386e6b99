use super::fetch::start_fetch;
use crate::aggregate::pipeline::{self, PipelineOutput, PipelinePlan, RegionOutcome};
use crate::config::FetchConfig;
use crate::fetch::replay;
use crate::formats::ConstituencyDump;
use crate::model::election::Aggregate;
use crate::model::region::Region;
use crate::reports::render::write_csv;
use crate::util::{read_serialized, write_serialized};
use colored::*;
use serde::Serialize;
use std::error::Error;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct ReportOptions {
    /// Replay a saved dump instead of fetching live.
    pub input: Option<PathBuf>,
    /// Regions to report on; empty means one report over every region.
    pub regions: Vec<Region>,
    /// Write one CSV per region here instead of to stdout.
    pub output_dir: Option<PathBuf>,
    /// Write every aggregate snapshot here as JSON.
    pub snapshots: Option<PathBuf>,
    /// Save the raw constituency results of a live fetch here.
    pub save_constituencies: Option<PathBuf>,
}

#[derive(Serialize)]
struct SnapshotFile<'a> {
    scope: String,
    snapshots: &'a [Aggregate],
}

pub async fn report(config: &FetchConfig, options: &ReportOptions) -> Result<(), Box<dyn Error>> {
    let handle = match &options.input {
        Some(path) => {
            let dump: ConstituencyDump = read_serialized(path)?;
            eprintln!(
                "📂 Replaying {} constituencies for {} (fetched {})",
                dump.constituencies.len().to_string().bright_yellow(),
                dump.election.bright_cyan(),
                dump.fetched_at.format("%Y-%m-%d %H:%M UTC")
            );
            replay(dump.constituencies, config.channel_capacity)
        }
        None => start_fetch(config).await?,
    };

    let mut plan = PipelinePlan::new(&options.regions);
    plan.keep_snapshots = options.snapshots.is_some();
    plan.keep_records = options.save_constituencies.is_some();

    let mut output = pipeline::run(handle, &plan).await?;
    eprintln!(
        "📊 Aggregated {} constituencies",
        output.records_received.to_string().bright_green()
    );

    if let Some(path) = &options.save_constituencies {
        let records = std::mem::take(&mut output.records);
        write_serialized(path, &ConstituencyDump::new(&config.election, records))?;
    }

    if let Some(path) = &options.snapshots {
        write_snapshots(path, &output)?;
    }

    for outcome in &output.outcomes {
        print_outcome(outcome, options.output_dir.as_deref())?;
    }

    Ok(())
}

fn write_snapshots(path: &Path, output: &PipelineOutput) -> io::Result<()> {
    let files: Vec<SnapshotFile> = output
        .outcomes
        .iter()
        .map(|outcome| SnapshotFile {
            scope: outcome.scope(),
            snapshots: &outcome.snapshots,
        })
        .collect();
    write_serialized(path, &files)
}

fn print_outcome(outcome: &RegionOutcome, output_dir: Option<&Path>) -> Result<(), Box<dyn Error>> {
    eprintln!(
        "\n🏆 {} ({} seats, {} parties, {} votes)",
        outcome.scope().bright_cyan().bold(),
        outcome.aggregate.seats.to_string().bright_yellow(),
        outcome.report.len().to_string().bright_yellow(),
        outcome.report.total_votes().to_string().bright_yellow()
    );

    match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_name = match outcome.filter {
                Some(region) => format!("{}.csv", region.slug()),
                None => "all-regions.csv".to_string(),
            };
            let path = dir.join(file_name);
            write_csv(&outcome.report, File::create(&path)?)?;
            eprintln!("  ✅ Wrote {}", path.display().to_string().bright_green());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_csv(&outcome.report, &mut handle)?;
            handle.flush()?;
        }
    }

    Ok(())
}
