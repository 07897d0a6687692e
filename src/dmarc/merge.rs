use crate::dmarc::types::Report;
use crate::error::Result;
use crate::template::TemplateSet;
use tracing::debug;

/// Group reports by their rendered merge key and combine each group into a
/// single report.
///
/// Key rendering failure for any report aborts the whole merge. Groups keep
/// the first-seen key order, and the first report of a group keeps its
/// identity fields (report id, reporter, published policy); later reports
/// contribute their records and widen the covered date range.
pub fn group_merge_reports(reports: Vec<Report>, templates: &TemplateSet) -> Result<Vec<Report>> {
    let mut groups: Vec<(String, Report)> = Vec::new();

    for report in reports {
        let key = templates.render_merge_key(&report)?;

        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, merged)) => {
                debug!(key = %key, "merging report into existing group");
                merge_into(merged, report);
            }
            None => {
                debug!(key = %key, "new merge group");
                groups.push((key, report));
            }
        }
    }

    Ok(groups.into_iter().map(|(_, report)| report).collect())
}

fn merge_into(base: &mut Report, other: Report) {
    let range = &mut base.report_metadata.date_range;
    range.begin = range.begin.min(other.report_metadata.date_range.begin);
    range.end = range.end.max(other.report_metadata.date_range.end);
    base.records.extend(other.records);
}
