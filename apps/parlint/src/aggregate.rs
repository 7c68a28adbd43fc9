//! Merging of partial reports.

use crate::models::Report;

/// Merge partial reports into one.
///
/// Totals are summed, so they do not depend on input order. File reports are
/// concatenated in input order; pass partials in partition order to get a
/// stable display order.
pub fn merge<I>(reports: I) -> Report
where
    I: IntoIterator<Item = Report>,
{
    reports.into_iter().fold(Report::default(), |mut acc, r| {
        acc.error_count += r.error_count;
        acc.warning_count += r.warning_count;
        acc.results.extend(r.results);
        acc
    })
}
