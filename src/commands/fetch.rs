use crate::config::FetchConfig;
use crate::fetch::client::CandidatesClient;
use crate::fetch::{spawn_fetch, with_retries, ConstituencySource, FetchHandle, FetchResult};
use crate::formats::ConstituencyDump;
use crate::util::write_serialized;
use colored::*;
use instant::Instant;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Download every constituency result for the configured election and save
/// them for later `report --input` runs.
pub async fn fetch(config: &FetchConfig, output: &Path) -> Result<(), Box<dyn Error>> {
    eprintln!(
        "🚀 Fetching results for {} from {}",
        config.election.bright_cyan(),
        config.base_url.bright_cyan()
    );

    let start = Instant::now();
    let records = start_fetch(config).await?.collect().await?;

    let dump = ConstituencyDump::new(&config.election, records);
    write_serialized(output, &dump)?;

    info!(
        constituencies = dump.constituencies.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "fetch complete"
    );
    eprintln!(
        "✅ Saved {} constituencies to {}",
        dump.constituencies.len().to_string().bright_green(),
        output.display().to_string().bright_green()
    );

    Ok(())
}

/// List the election's ballots and start fetching them in the background.
pub(crate) async fn start_fetch(config: &FetchConfig) -> FetchResult<FetchHandle> {
    let client = Arc::new(CandidatesClient::new(config)?);

    let ballot_ids = with_retries(
        &config.election,
        config.max_retries,
        config.retry_backoff,
        || client.ballot_ids(&config.election),
    )
    .await?;

    eprintln!(
        "📋 Found {} ballots, fetching up to {} at a time",
        ballot_ids.len().to_string().bright_yellow(),
        config.concurrency
    );

    Ok(spawn_fetch(client, ballot_ids, config))
}
