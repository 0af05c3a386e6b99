use super::{MisrepresentationReport, PartyOutcome, ReportError, ReportResult};
use crate::model::election::Aggregate;

/// Compare simulated and actual seats for every party the aggregate knows.
///
/// Parties that share a display name (two independents called the same
/// thing, say) are combined into one line rather than overwriting each other.
pub fn misrepresentation_report(aggregate: &Aggregate) -> ReportResult<MisrepresentationReport> {
    if aggregate.seats == 0 {
        return Err(ReportError::DivisionByZero);
    }
    let total_seats = aggregate.seats as f64;

    let mut report = MisrepresentationReport {
        seats: aggregate.seats,
        ..MisrepresentationReport::default()
    };

    for (id, party) in &aggregate.parties {
        let votes = aggregate.votes.get(id).copied().unwrap_or(0);
        let d_hondt_seats = aggregate.d_hondt_seats.get(id).copied().unwrap_or(0);
        let actual_seats = aggregate.actual_seats.get(id).copied().unwrap_or(0);

        let outcome = report
            .parties
            .entry(party.name.clone())
            .or_insert(PartyOutcome {
                votes: 0,
                d_hondt_seats: 0,
                actual_seats: 0,
                misrepresentation_error: 0.0,
            });
        outcome.votes += votes;
        outcome.d_hondt_seats += d_hondt_seats;
        outcome.actual_seats += actual_seats;
        outcome.misrepresentation_error =
            (outcome.actual_seats as f64 - outcome.d_hondt_seats as f64) / total_seats;
    }

    Ok(report)
}
