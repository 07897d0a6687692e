use crate::dmarc::Report;
use crate::error::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use tera::{Context, Tera, Value};

/// Merge-key template used when the configuration does not set one: reports
/// from the same reporting organization about the same published policy
/// domain are considered mergeable.
pub const DEFAULT_MERGE_KEY: &str =
    "{{ report_metadata.org_name }}!{{ report_metadata.email }}!{{ policy_published.domain }}";

const BODY_TEMPLATE: &str = "body";
const FILENAME_TEMPLATE: &str = "filename";
const MERGE_KEY_TEMPLATE: &str = "merge_key";

/// The three templates a run needs, compiled once at configuration load and
/// immutable afterwards. All of them share the `now(format=..)` function
/// extension on top of the engine's built-ins.
pub struct TemplateSet {
    tera: Tera,
}

impl TemplateSet {
    /// Compile the output-body, output-filename, and merge-key templates.
    ///
    /// `body` is absent for structured (JSON) output, `filename` is absent
    /// when the output target is the standard stream.
    pub fn compile(body: Option<&str>, filename: Option<&str>, merge_key: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.register_function("now", now_function);

        if let Some(source) = body {
            tera.add_raw_template(BODY_TEMPLATE, source)?;
        }
        if let Some(source) = filename {
            tera.add_raw_template(FILENAME_TEMPLATE, source)?;
        }
        tera.add_raw_template(MERGE_KEY_TEMPLATE, merge_key)?;

        Ok(Self { tera })
    }

    /// Render the output body for one report. The report's fields form the
    /// template root; `assets_path` is injected alongside them.
    pub fn render_body(&self, report: &Report, assets_path: &str) -> Result<String> {
        let mut context = Context::from_serialize(report)?;
        context.insert("assets_path", assets_path);
        Ok(self.tera.render(BODY_TEMPLATE, &context)?)
    }

    /// Render the output file name for one report.
    pub fn render_filename(&self, report: &Report) -> Result<String> {
        let context = Context::from_serialize(report)?;
        Ok(self.tera.render(FILENAME_TEMPLATE, &context)?)
    }

    /// Render the merge grouping key for one report.
    pub fn render_merge_key(&self, report: &Report) -> Result<String> {
        let context = Context::from_serialize(report)?;
        Ok(self.tera.render(MERGE_KEY_TEMPLATE, &context)?)
    }
}

impl fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSet").finish_non_exhaustive()
    }
}

/// `now(format="%Y-%m-%d")` — current UTC time, formatted with chrono's
/// strftime syntax.
fn now_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let format = args
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("%Y-%m-%d %H:%M:%S");

    let mut rendered = String::new();
    write!(rendered, "{}", Utc::now().format(format))
        .map_err(|_| tera::Error::msg(format!("invalid time format '{}'", format)))?;

    Ok(Value::String(rendered))
}
