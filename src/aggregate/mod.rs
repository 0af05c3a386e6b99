pub mod pipeline;

use crate::allocation::{dhondt, AllocationResult};
use crate::model::election::{Aggregate, ConstituencyResult, SeatAssignments};
use crate::model::region::Region;
use crate::util::additive_merge;

/// Folds constituency results into running totals, one record at a time.
///
/// Records outside the region filter are ignored entirely. Every record that
/// is folded in produces a fresh [`Aggregate`] snapshot with the D'Hondt
/// simulation recomputed over the totals so far.
#[derive(Debug, Clone)]
pub struct Aggregator {
    filter: Option<Region>,
    current: Aggregate,
}

impl Aggregator {
    pub fn new(filter: Option<Region>) -> Self {
        Self {
            filter,
            current: Aggregate::default(),
        }
    }

    pub fn filter(&self) -> Option<Region> {
        self.filter
    }

    pub fn accepts(&self, record: &ConstituencyResult) -> bool {
        self.filter.map_or(true, |region| region == record.region)
    }

    /// Fold one record in. Returns `None` without touching state when the
    /// record is filtered out, otherwise the new snapshot.
    pub fn push(&mut self, record: &ConstituencyResult) -> AllocationResult<Option<Aggregate>> {
        if !self.accepts(record) {
            return Ok(None);
        }

        self.current = fold_step(&self.current, record)?;
        Ok(Some(self.current.clone()))
    }

    #[cfg(test)]
    pub fn current(&self) -> &Aggregate {
        &self.current
    }

    pub fn finish(self) -> Aggregate {
        self.current
    }
}

/// Produce the aggregate that results from folding `record` into `acc`.
pub fn fold_step(acc: &Aggregate, record: &ConstituencyResult) -> AllocationResult<Aggregate> {
    let votes = additive_merge(&acc.votes, &record.votes);

    let mut parties = acc.parties.clone();
    parties.extend(
        record
            .parties
            .iter()
            .map(|(id, party)| (id.clone(), party.clone())),
    );

    let elected = additive_merge(&acc.actual_seats, &record.elected);
    let seats = acc.seats + 1;
    let d_hondt_seats = dhondt::distribute(&votes, seats)?;

    // Same key set as `parties`, zero where nobody was elected.
    let actual_seats: SeatAssignments = parties
        .keys()
        .map(|id| (id.clone(), elected.get(id).copied().unwrap_or(0)))
        .collect();

    Ok(Aggregate {
        votes,
        parties,
        d_hondt_seats,
        actual_seats,
        seats,
    })
}
