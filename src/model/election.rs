use super::region::Region;
use super::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key votes and seats are tallied under.
///
/// Normally a party's Electoral Commission id; for independents it is the
/// candidate's own person id, so each independent tallies separately.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(pub String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        PartyId(id.into())
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyId {
    fn from(id: &str) -> Self {
        PartyId(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
    pub name: String,
}

impl Party {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Party {
            id: id.into(),
            name: name.into(),
        }
    }
}

pub type VoteData = BTreeMap<PartyId, u64>;
pub type SeatAssignments = BTreeMap<PartyId, u32>;

/// Result of a single constituency, already keyed by party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstituencyResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot_paper_id: Option<String>,
    pub region: Region,
    pub parties: BTreeMap<PartyId, Party>,
    pub votes: VoteData,
    pub elected: SeatAssignments,
}

impl ConstituencyResult {
    /// Build a result, rejecting records whose maps disagree with each other.
    ///
    /// Every key that carries votes or seats must have party metadata, and a
    /// constituency must have at least one candidate.
    pub fn new(
        ballot_paper_id: Option<String>,
        region: Region,
        parties: BTreeMap<PartyId, Party>,
        votes: VoteData,
        elected: SeatAssignments,
    ) -> ModelResult<Self> {
        let result = ConstituencyResult {
            ballot_paper_id,
            region,
            parties,
            votes,
            elected,
        };
        result.validate()?;
        Ok(result)
    }

    /// Re-check the invariants `new` enforces; used on records loaded from disk.
    pub fn validate(&self) -> ModelResult<()> {
        let context = || {
            self.ballot_paper_id
                .clone()
                .unwrap_or_else(|| format!("{} constituency", self.region))
        };

        if self.parties.is_empty() {
            return Err(ModelError::SchemaMismatch {
                context: context(),
                reason: "no candidacies".to_string(),
            });
        }

        let unknown = self
            .votes
            .keys()
            .chain(self.elected.keys())
            .find(|id| !self.parties.contains_key(*id));

        if let Some(id) = unknown {
            return Err(ModelError::SchemaMismatch {
                context: context(),
                reason: format!("tally key {} has no party metadata", id),
            });
        }

        Ok(())
    }
}

/// Running totals after some number of constituencies have been folded in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub votes: VoteData,
    pub parties: BTreeMap<PartyId, Party>,
    pub d_hondt_seats: SeatAssignments,
    pub actual_seats: SeatAssignments,
    /// Constituencies folded so far; also the number of seats the D'Hondt
    /// simulation distributes.
    pub seats: u32,
}

impl Aggregate {
    #[cfg(test)]
    pub fn party_name(&self, id: &PartyId) -> Option<&str> {
        self.parties.get(id).map(|party| party.name.as_str())
    }
}
