use crate::dmarc::lookup;
use crate::dmarc::types::Report;
use crate::error::{ConvertError, Result};
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Read one report delivery from `input` and parse it into a [`Report`].
///
/// The payload may be wrapped in a gzip or zip container (detected by magic
/// bytes, not by file name) and may be either the XML schema published by
/// receivers or a previously emitted JSON report. When `lookup_addr` is set
/// and the report carries at most `lookup_limit` records, each record's
/// source IP is annotated with its reverse-DNS name.
pub fn read_parse<R: Read>(
    mut input: R,
    label: &str,
    lookup_addr: bool,
    lookup_limit: usize,
) -> Result<Report> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;

    let payload = decode_container(&data, label)?;
    let mut report = parse_payload(&payload, label)?;
    debug!(
        source = label,
        org = %report.report_metadata.org_name,
        records = report.records.len(),
        "parsed report"
    );

    if lookup_addr {
        lookup::annotate_hostnames(&mut report, lookup_limit);
    }

    Ok(report)
}

/// Unwrap a gzip or zip container around the report payload. Anything
/// without a recognized magic prefix passes through unchanged.
fn decode_container(data: &[u8], label: &str) -> Result<Vec<u8>> {
    if data.starts_with(GZIP_MAGIC) {
        let mut payload = Vec::new();
        GzDecoder::new(data)
            .read_to_end(&mut payload)
            .map_err(|e| ConvertError::Report {
                message: format!("gzip decode of {} failed: {}", label, e),
            })?;
        return Ok(payload);
    }

    if data.starts_with(ZIP_MAGIC) {
        let mut archive =
            ZipArchive::new(Cursor::new(data)).map_err(|e| ConvertError::Report {
                message: format!("zip decode of {} failed: {}", label, e),
            })?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| ConvertError::Report {
                message: format!("zip decode of {} failed: {}", label, e),
            })?;
            if entry.is_dir() {
                continue;
            }
            let mut payload = Vec::new();
            entry.read_to_end(&mut payload)?;
            return Ok(payload);
        }

        return Err(ConvertError::Report {
            message: format!("zip archive {} contains no files", label),
        });
    }

    Ok(data.to_vec())
}

/// Dispatch on the first payload byte: `{` starts a JSON report, `<` an XML
/// one.
fn parse_payload(payload: &[u8], label: &str) -> Result<Report> {
    let first = payload
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .copied()
        .unwrap_or(0);

    match first {
        b'{' => serde_json::from_slice(payload).map_err(|e| ConvertError::Report {
            message: format!("json parse of {} failed: {}", label, e),
        }),
        b'<' => quick_xml::de::from_reader(payload).map_err(|e| ConvertError::Report {
            message: format!("xml parse of {} failed: {}", label, e),
        }),
        _ => Err(ConvertError::Report {
            message: format!("{} is not a recognized report payload", label),
        }),
    }
}

/// Real-shaped aggregate report used as a fixture by tests across the crate.
#[cfg(test)]
pub(crate) const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feedback>
  <report_metadata>
    <org_name>Example</org_name>
    <email>dmarc@example.com</email>
    <report_id>7824093212193939512</report_id>
    <date_range>
      <begin>1700000000</begin>
      <end>1700086400</end>
    </date_range>
  </report_metadata>
  <policy_published>
    <domain>example.com</domain>
    <adkim>r</adkim>
    <aspf>r</aspf>
    <p>none</p>
    <sp>none</sp>
    <pct>100</pct>
  </policy_published>
  <record>
    <row>
      <source_ip>192.0.2.1</source_ip>
      <count>3</count>
      <policy_evaluated>
        <disposition>none</disposition>
        <dkim>pass</dkim>
        <spf>fail</spf>
      </policy_evaluated>
    </row>
    <identifiers>
      <header_from>example.com</header_from>
    </identifiers>
    <auth_results>
      <dkim>
        <domain>example.com</domain>
        <selector>default</selector>
        <result>pass</result>
      </dkim>
      <spf>
        <domain>example.com</domain>
        <result>fail</result>
      </spf>
    </auth_results>
  </record>
  <record>
    <row>
      <source_ip>198.51.100.9</source_ip>
      <count>1</count>
      <policy_evaluated>
        <disposition>quarantine</disposition>
        <dkim>fail</dkim>
        <spf>fail</spf>
        <reason>
          <type>forwarded</type>
          <comment>looks like a mailing list</comment>
        </reason>
      </policy_evaluated>
    </row>
    <identifiers>
      <header_from>example.com</header_from>
    </identifiers>
    <auth_results>
      <spf>
        <domain>other.example</domain>
        <result>fail</result>
      </spf>
    </auth_results>
  </record>
</feedback>
"#;
