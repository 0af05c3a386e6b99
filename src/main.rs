mod aggregate;
mod allocation;
mod commands;
mod config;
mod fetch;
mod formats;
mod model;
mod reports;
mod util;

use crate::commands::{fetch, report, ReportOptions};
use crate::config::{
    FetchConfig, DEFAULT_BASE_URL, DEFAULT_CONCURRENCY, DEFAULT_CONSTITUENCY_FILE,
    DEFAULT_ELECTION, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS,
};
use crate::model::region::Region;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Compare first-past-the-post seat outcomes with a D'Hondt simulation.
#[derive(Parser)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Args)]
struct FetchOpts {
    /// Base URL of the candidates API
    #[clap(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Election slug (e.g. "parl.2019-12-12")
    #[clap(long, default_value = DEFAULT_ELECTION)]
    election: String,
    /// Maximum ballot requests in flight at once
    #[clap(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
    /// Retries per request before the whole fetch fails
    #[clap(long, default_value_t = DEFAULT_MAX_RETRIES)]
    retries: u32,
    /// Per-request timeout in seconds
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl FetchOpts {
    fn into_config(self) -> FetchConfig {
        FetchConfig {
            base_url: self.base_url,
            election: self.election,
            concurrency: self.concurrency,
            max_retries: self.retries,
            timeout: Duration::from_secs(self.timeout_secs),
            ..FetchConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Download every constituency result and save it as JSON.
    Fetch {
        #[clap(flatten)]
        fetch: FetchOpts,
        /// Where to write the constituency results
        #[clap(long, default_value = DEFAULT_CONSTITUENCY_FILE)]
        output: PathBuf,
    },
    /// Aggregate results and print simulated vs actual seats as CSV.
    Report {
        #[clap(flatten)]
        fetch: FetchOpts,
        /// Replay results saved by `fetch` instead of fetching live
        #[clap(long)]
        input: Option<PathBuf>,
        /// Report on a single region; repeat for several. Omit for all regions
        #[clap(long = "region")]
        regions: Vec<Region>,
        /// Write one CSV per region into this directory instead of stdout
        #[clap(long)]
        output_dir: Option<PathBuf>,
        /// Write every intermediate aggregate to this JSON file
        #[clap(long)]
        snapshots: Option<PathBuf>,
        /// Also save the fetched constituency results to this JSON file
        #[clap(long, conflicts_with = "input")]
        save_constituencies: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();

    match opts.command {
        Command::Fetch { fetch: args, output } => {
            if let Err(e) = fetch(&args.into_config(), &output).await {
                eprintln!("❌ Fetch failed: {}", e);
                std::process::exit(1);
            }
        }
        Command::Report {
            fetch: args,
            input,
            regions,
            output_dir,
            snapshots,
            save_constituencies,
        } => {
            let options = ReportOptions {
                input,
                regions,
                output_dir,
                snapshots,
                save_constituencies,
            };
            if let Err(e) = report(&args.into_config(), &options).await {
                eprintln!("❌ Report failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accepts_repeated_regions() {
        let opts = Opts::try_parse_from([
            "seat-share",
            "report",
            "--region",
            "scotland",
            "--region",
            "northern-ireland",
        ])
        .unwrap();

        match opts.command {
            Command::Report { regions, .. } => {
                assert_eq!(regions, vec![Region::Scotland, Region::NorthernIreland])
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn saving_constituencies_conflicts_with_replay() {
        let result = Opts::try_parse_from([
            "seat-share",
            "report",
            "--input",
            "data/constituencies.json",
            "--save-constituencies",
            "out.json",
        ]);

        assert!(result.is_err());
    }
}
