use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod generator;
pub mod render;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Cannot compute misrepresentation: aggregate covers zero seats")]
    DivisionByZero,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;

/// One party's line in the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyOutcome {
    pub votes: u64,
    pub d_hondt_seats: u32,
    pub actual_seats: u32,
    /// `(actual - simulated) / total seats`; positive means over-represented.
    pub misrepresentation_error: f64,
}

/// Simulated versus actual seats, keyed by party display name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MisrepresentationReport {
    pub seats: u32,
    pub parties: BTreeMap<String, PartyOutcome>,
}

impl MisrepresentationReport {
    #[cfg(test)]
    pub fn get(&self, party_name: &str) -> Option<&PartyOutcome> {
        self.parties.get(party_name)
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn total_votes(&self) -> u64 {
        self.parties.values().map(|outcome| outcome.votes).sum()
    }
}
