mod fetch;
mod report;

pub use fetch::fetch;
pub use report::{report, ReportOptions};
