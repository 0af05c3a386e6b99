use super::{MisrepresentationReport, ReportResult};
use itertools::Itertools;
use std::io::Write;

pub const CSV_HEADER: [&str; 5] = ["party", "votes", "dHondt", "actual", "misrepError"];

/// Write the report as CSV, largest vote share first.
pub fn write_csv<W: Write>(report: &MisrepresentationReport, writer: W) -> ReportResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    let rows = report.parties.iter().sorted_by(|(a_name, a), (b_name, b)| {
        b.votes.cmp(&a.votes).then_with(|| a_name.cmp(b_name))
    });

    for (name, outcome) in rows {
        csv.write_record(&[
            name.clone(),
            outcome.votes.to_string(),
            outcome.d_hondt_seats.to_string(),
            outcome.actual_seats.to_string(),
            outcome.misrepresentation_error.to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}
