//! Wire types for the Democracy Club candidates API (`/api/next`).
//!
//! Only the fields the aggregation needs are modelled. Anything else in the
//! responses is ignored, but a missing required field is a hard error.

use crate::model::election::{ConstituencyResult, Party, PartyId, SeatAssignments, VoteData};
use crate::model::region::Region;
use crate::model::{ModelError, ModelResult};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Party id the API uses for candidates standing without a party description.
pub const INDEPENDENT_SENTINEL: &str = "ynmp-party:2";

/// `GET /elections/{slug}/`
#[derive(Debug, Deserialize)]
pub struct Election {
    pub ballots: Vec<BallotRef>,
}

#[derive(Debug, Deserialize)]
pub struct BallotRef {
    pub ballot_paper_id: String,
}

/// `GET /ballots/{ballot_paper_id}/`
#[derive(Debug, Deserialize)]
pub struct Ballot {
    #[serde(default)]
    pub ballot_paper_id: Option<String>,
    pub post: Post,
    pub candidacies: Vec<Candidacy>,
}

#[derive(Debug, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct Candidacy {
    pub person: Person,
    pub party: PartyRef,
    #[serde(default)]
    pub result: Option<CandidacyResult>,
}

#[derive(Debug, Deserialize)]
pub struct Person {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PartyRef {
    pub ec_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CandidacyResult {
    pub num_ballots: u64,
    #[serde(default)]
    pub elected: Option<bool>,
}

impl Candidacy {
    pub fn is_independent(&self) -> bool {
        self.party.ec_id == INDEPENDENT_SENTINEL
    }

    /// Tally key and metadata for this candidacy: the party, or for an
    /// independent the candidate standing as their own "party".
    pub fn party_entry(&self) -> (PartyId, Party) {
        if self.is_independent() {
            (
                PartyId::new(self.person.id.clone()),
                Party::new(self.person.id.clone(), self.person.name.clone()),
            )
        } else {
            (
                PartyId::new(self.party.ec_id.clone()),
                Party::new(self.party.ec_id.clone(), self.party.name.clone()),
            )
        }
    }
}

impl Ballot {
    /// Convert to a keyed constituency result.
    ///
    /// `requested_id` names the ballot in errors when the response omits its
    /// own `ballot_paper_id`. Every candidacy must carry a result.
    pub fn into_result(self, requested_id: &str) -> ModelResult<ConstituencyResult> {
        let ballot_paper_id = self
            .ballot_paper_id
            .unwrap_or_else(|| requested_id.to_string());
        let region = Region::classify(&self.post.id);

        let mut parties = BTreeMap::new();
        let mut votes = VoteData::new();
        let mut elected = SeatAssignments::new();

        for candidacy in &self.candidacies {
            let result = candidacy
                .result
                .as_ref()
                .ok_or_else(|| ModelError::SchemaMismatch {
                    context: ballot_paper_id.clone(),
                    reason: format!("candidacy for {} has no result", candidacy.person.name),
                })?;

            let (id, party) = candidacy.party_entry();
            *votes.entry(id.clone()).or_insert(0) += result.num_ballots;
            if result.elected.unwrap_or(false) {
                *elected.entry(id.clone()).or_insert(0) += 1;
            }
            parties.insert(id, party);
        }

        ConstituencyResult::new(Some(ballot_paper_id), region, parties, votes, elected)
    }
}

/// The API has served ids both as JSON strings and as bare integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
