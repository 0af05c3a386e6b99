//! Drives aggregation over a live (or replayed) fetch.
//!
//! Results are pulled one at a time from the fetch channel and folded into
//! one [`Aggregator`] per requested region filter, so several regional
//! reports come out of a single pass over the data. Reports are only built
//! once the channel has closed cleanly; any failure along the way returns an
//! error and no report at all.

use super::Aggregator;
use crate::allocation::AllocationError;
use crate::fetch::{FetchError, FetchHandle};
use crate::model::election::{Aggregate, ConstituencyResult};
use crate::model::region::Region;
use crate::reports::generator::misrepresentation_report;
use crate::reports::{MisrepresentationReport, ReportError};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Fetch stage failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Aggregation stage failed: {0}")]
    Allocation(#[from] AllocationError),
    #[error("Report stage failed for {scope}: {source}")]
    Report {
        scope: String,
        #[source]
        source: ReportError,
    },
    #[error("Fetch task ended abnormally: {0}")]
    Producer(String),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// What to aggregate and what to keep along the way.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    /// One report per entry; `None` means every region.
    pub filters: Vec<Option<Region>>,
    pub keep_snapshots: bool,
    pub keep_records: bool,
}

impl PipelinePlan {
    pub fn new(regions: &[Region]) -> Self {
        let filters = if regions.is_empty() {
            vec![None]
        } else {
            regions.iter().copied().map(Some).collect()
        };

        Self {
            filters,
            keep_snapshots: false,
            keep_records: false,
        }
    }
}

/// Final state and report for one region filter.
#[derive(Debug, Clone)]
pub struct RegionOutcome {
    pub filter: Option<Region>,
    pub aggregate: Aggregate,
    pub report: MisrepresentationReport,
    /// Every snapshot emitted along the way, oldest first. Empty unless the
    /// plan asked for them.
    pub snapshots: Vec<Aggregate>,
}

impl RegionOutcome {
    pub fn scope(&self) -> String {
        scope_label(self.filter)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub outcomes: Vec<RegionOutcome>,
    pub records_received: usize,
    /// Raw records in arrival order, when the plan asked for them.
    pub records: Vec<ConstituencyResult>,
}

pub fn scope_label(filter: Option<Region>) -> String {
    match filter {
        Some(region) => region.to_string(),
        None => "All regions".to_string(),
    }
}

struct Lane {
    aggregator: Aggregator,
    snapshots: Vec<Aggregate>,
}

/// Consume `handle` to completion and report on every filter in `plan`.
pub async fn run(handle: FetchHandle, plan: &PipelinePlan) -> PipelineResult<PipelineOutput> {
    let FetchHandle { mut results, task } = handle;

    let mut lanes: Vec<Lane> = plan
        .filters
        .iter()
        .map(|filter| Lane {
            aggregator: Aggregator::new(*filter),
            snapshots: Vec::new(),
        })
        .collect();
    let mut records = Vec::new();
    let mut records_received = 0usize;

    while let Some(result) = results.recv().await {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                task.abort();
                return Err(e.into());
            }
        };
        records_received += 1;
        debug!(
            ballot = record.ballot_paper_id.as_deref().unwrap_or("-"),
            region = %record.region,
            "folding constituency"
        );

        for lane in &mut lanes {
            let snapshot = match lane.aggregator.push(&record) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    task.abort();
                    return Err(e.into());
                }
            };
            if let Some(snapshot) = snapshot.filter(|_| plan.keep_snapshots) {
                lane.snapshots.push(snapshot);
            }
        }

        if plan.keep_records {
            records.push(record);
        }
    }

    // A closed channel is only a clean finish if the producer finished too.
    task.await.map_err(|e| PipelineError::Producer(e.to_string()))?;

    let mut outcomes = Vec::with_capacity(lanes.len());
    for lane in lanes {
        let filter = lane.aggregator.filter();
        let aggregate = lane.aggregator.finish();
        let report =
            misrepresentation_report(&aggregate).map_err(|source| PipelineError::Report {
                scope: scope_label(filter),
                source,
            })?;

        info!(
            scope = %scope_label(filter),
            seats = aggregate.seats,
            parties = aggregate.parties.len(),
            "aggregation complete"
        );

        outcomes.push(RegionOutcome {
            filter,
            aggregate,
            report,
            snapshots: lane.snapshots,
        });
    }

    Ok(PipelineOutput {
        outcomes,
        records_received,
        records,
    })
}
