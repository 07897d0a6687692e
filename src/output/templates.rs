//! Built-in report template sources, selected by `output.format`.

/// Plain-text body for `format = "txt"`.
pub const TXT_TEMPLATE: &str = r#"DMARC aggregate report from {{ report_metadata.org_name }} <{{ report_metadata.email }}>

Report ID : {{ report_metadata.report_id }}
Period    : {{ report_metadata.date_range.begin | date(format="%Y-%m-%d %H:%M:%S") }} UTC .. {{ report_metadata.date_range.end | date(format="%Y-%m-%d %H:%M:%S") }} UTC
Generated : {{ now() }} UTC

Published policy for {{ policy_published.domain }}:
  p={{ policy_published.p }} sp={{ policy_published.sp }} pct={{ policy_published.pct }} adkim={{ policy_published.adkim }} aspf={{ policy_published.aspf }}

{% for record in records -%}
{{ record.row.source_ip }}{% if record.row.source_hostname %} ({{ record.row.source_hostname }}){% endif %}: {{ record.row.count }} message(s), disposition={{ record.row.policy_evaluated.disposition }}, dkim={{ record.row.policy_evaluated.dkim }}, spf={{ record.row.policy_evaluated.spf }}, header_from={{ record.identifiers.header_from }}
{% endfor %}"#;

/// Dynamic HTML body for `format = "html"`; stylesheet and script are
/// expected under `output.assets_path`.
pub const HTML_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>DMARC report {{ report_metadata.report_id }} for {{ policy_published.domain }}</title>
<link rel="stylesheet" href="{{ assets_path }}/dmarc-report.css">
<script src="{{ assets_path }}/dmarc-report.js" defer></script>
</head>
<body>
<h1>{{ policy_published.domain }}</h1>
<p class="meta">
Reported by {{ report_metadata.org_name }} &lt;{{ report_metadata.email }}&gt;<br>
Report ID {{ report_metadata.report_id }},
{{ report_metadata.date_range.begin | date(format="%Y-%m-%d %H:%M") }} UTC &ndash;
{{ report_metadata.date_range.end | date(format="%Y-%m-%d %H:%M") }} UTC
</p>
<p class="policy">
Published policy: p={{ policy_published.p }} sp={{ policy_published.sp }}
pct={{ policy_published.pct }} adkim={{ policy_published.adkim }} aspf={{ policy_published.aspf }}
</p>
<table id="records">
<thead>
<tr><th>Source IP</th><th>Hostname</th><th>Count</th><th>Disposition</th><th>DKIM</th><th>SPF</th><th>Header From</th></tr>
</thead>
<tbody>
{% for record in records -%}
<tr class="{% if record.row.policy_evaluated.dkim == "pass" or record.row.policy_evaluated.spf == "pass" %}pass{% else %}fail{% endif %}">
<td>{{ record.row.source_ip }}</td>
<td>{{ record.row.source_hostname }}</td>
<td>{{ record.row.count }}</td>
<td>{{ record.row.policy_evaluated.disposition }}</td>
<td>{{ record.row.policy_evaluated.dkim }}</td>
<td>{{ record.row.policy_evaluated.spf }}</td>
<td>{{ record.identifiers.header_from }}</td>
</tr>
{% endfor -%}
</tbody>
</table>
<footer>Generated {{ now() }} UTC</footer>
</body>
</html>
"##;

/// Self-contained HTML body for `format = "html_static"`; no external
/// assets, safe to mail around or drop on a share.
pub const HTML_STATIC_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>DMARC report {{ report_metadata.report_id }} for {{ policy_published.domain }}</title>
<style>
body { font-family: sans-serif; margin: 2em; color: #222; }
h1 { margin-bottom: 0.2em; }
p.meta, footer { color: #666; font-size: 0.9em; }
table { border-collapse: collapse; margin-top: 1em; }
th, td { border: 1px solid #ccc; padding: 0.3em 0.6em; text-align: left; }
tr.pass td { background: #e8f5e9; }
tr.fail td { background: #fdecea; }
</style>
</head>
<body>
<h1>{{ policy_published.domain }}</h1>
<p class="meta">
Reported by {{ report_metadata.org_name }} &lt;{{ report_metadata.email }}&gt;<br>
Report ID {{ report_metadata.report_id }},
{{ report_metadata.date_range.begin | date(format="%Y-%m-%d %H:%M") }} UTC &ndash;
{{ report_metadata.date_range.end | date(format="%Y-%m-%d %H:%M") }} UTC
</p>
<p class="policy">
Published policy: p={{ policy_published.p }} sp={{ policy_published.sp }}
pct={{ policy_published.pct }} adkim={{ policy_published.adkim }} aspf={{ policy_published.aspf }}
</p>
<table>
<thead>
<tr><th>Source IP</th><th>Hostname</th><th>Count</th><th>Disposition</th><th>DKIM</th><th>SPF</th><th>Header From</th></tr>
</thead>
<tbody>
{% for record in records -%}
<tr class="{% if record.row.policy_evaluated.dkim == "pass" or record.row.policy_evaluated.spf == "pass" %}pass{% else %}fail{% endif %}">
<td>{{ record.row.source_ip }}</td>
<td>{{ record.row.source_hostname }}</td>
<td>{{ record.row.count }}</td>
<td>{{ record.row.policy_evaluated.disposition }}</td>
<td>{{ record.row.policy_evaluated.dkim }}</td>
<td>{{ record.row.policy_evaluated.spf }}</td>
<td>{{ record.identifiers.header_from }}</td>
</tr>
{% endfor -%}
</tbody>
</table>
<footer>Generated {{ now() }} UTC</footer>
</body>
</html>
"##;
