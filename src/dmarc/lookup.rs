use crate::dmarc::types::Report;
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::debug;

/// Annotate every record's source IP with its reverse-DNS name.
///
/// Reports with more than `limit` records are skipped wholesale: large
/// reports from big receivers would otherwise turn one conversion run into
/// thousands of blocking DNS queries. Lookups are cached per IP within a
/// report, and failures leave the hostname empty.
pub fn annotate_hostnames(report: &mut Report, limit: usize) {
    if report.records.len() > limit {
        debug!(
            records = report.records.len(),
            limit, "too many records, skipping reverse dns lookups"
        );
        return;
    }

    let mut cache: HashMap<IpAddr, String> = HashMap::new();

    for record in &mut report.records {
        let ip: IpAddr = match record.row.source_ip.parse() {
            Ok(ip) => ip,
            Err(_) => {
                debug!(source_ip = %record.row.source_ip, "not a valid IP address, skipping lookup");
                continue;
            }
        };

        let hostname = cache
            .entry(ip)
            .or_insert_with(|| dns_lookup::lookup_addr(&ip).unwrap_or_default());
        record.row.source_hostname = hostname.clone();
    }
}
