pub mod democracy_club;

use crate::model::election::ConstituencyResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw per-constituency results as written by `fetch`, replayable by `report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstituencyDump {
    pub election: String,
    pub fetched_at: DateTime<Utc>,
    pub constituencies: Vec<ConstituencyResult>,
}

impl ConstituencyDump {
    pub fn new(election: &str, constituencies: Vec<ConstituencyResult>) -> Self {
        Self {
            election: election.to_string(),
            fetched_at: Utc::now(),
            constituencies,
        }
    }
}
