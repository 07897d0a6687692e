use crate::error::{ConvertError, Result};
use crate::output::templates::{HTML_STATIC_TEMPLATE, HTML_TEMPLATE, TXT_TEMPLATE};
use crate::template::{TemplateSet, DEFAULT_MERGE_KEY};
use path_clean::PathClean;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LOOKUP_LIMIT: usize = 50;

/// A commented configuration document, written by `--generate-config`.
pub const SAMPLE_CONFIG: &str = r##"# dmarc-convert configuration.

# Resolve source IPs to hostnames while parsing.
lookup_addr = false
# Skip lookups for reports carrying more than this many records.
lookup_limit = 50

# Combine reports that share a merge key before writing output.
merge_reports = false
# merge_key = '{{ report_metadata.org_name }}!{{ report_metadata.email }}!{{ policy_published.domain }}'

log_debug = false
log_datetime = false

# Where report deliveries are read from and what happens to consumed files.
[input]
dir = "input"
# Delete consumed files. Mutually exclusive with archive_dir.
delete = false
# Move consumed files here instead of deleting them.
# archive_dir = "archive"

# The mailbox DMARC reports are delivered to. Fetching is handled by an
# external delivery step; these settings describe that mailbox.
[input.imap]
server = ""
username = ""
password = ""
mailbox = "INBOX"
debug = false
delete = false
# One of: tls, starttls, plaintext.
security = "tls"

[output]
# Output file name template; empty or "stdout" writes to standard output.
file = 'reports/{{ policy_published.domain }}!{{ report_metadata.date_range.begin | date(format="%Y%m%d") }}.html'
# One of: txt, html, html_static, external_template, json.
format = "html_static"
# Base path for stylesheet/script links in the html format.
assets_path = ""
# Body template file, required for the external_template format.
# external_template = "templates/report.tmpl"
"##;

/// Output format, each variant carrying its own template-source rule in
/// [`Config::from_document`]. Unknown values fail at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Txt,
    Html,
    HtmlStatic,
    ExternalTemplate,
    Json,
}

/// IMAP connection security. Defaults to the strongest option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImapSecurity {
    #[default]
    Tls,
    Starttls,
    Plaintext,
}

/// The `input.imap` section. Message retrieval itself is an external
/// delivery concern; the section is validated and carried for it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImapConfig {
    pub server: String,
    pub username: String,
    pub password: String,
    pub mailbox: String,
    pub debug: bool,
    pub delete: bool,
    pub security: ImapSecurity,
}

impl ImapConfig {
    pub fn is_configured(&self) -> bool {
        !self.server.is_empty()
    }
}

/// The configuration document as deserialized, before validation and
/// normalization. Every field is optional in the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub lookup_addr: bool,
    pub lookup_limit: i64,
    pub merge_reports: bool,
    pub merge_key: Option<String>,
    pub log_debug: bool,
    pub log_datetime: bool,
    pub input: RawInput,
    pub output: RawOutput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawInput {
    pub dir: PathBuf,
    pub imap: ImapConfig,
    pub delete: bool,
    pub archive_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOutput {
    pub file: String,
    pub format: Option<OutputFormat>,
    pub assets_path: String,
    pub external_template: Option<PathBuf>,
}

/// Validated, normalized run configuration. Built once per process by
/// [`Config::load`] and never mutated afterwards; the compiled templates are
/// plain fields of the same immutable value.
#[derive(Debug)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub lookup_addr: bool,
    pub lookup_limit: usize,
    pub merge_reports: bool,
    pub log_debug: bool,
    pub log_datetime: bool,
    pub templates: TemplateSet,
}

#[derive(Debug, Clone)]
pub struct InputConfig {
    pub dir: PathBuf,
    pub imap: ImapConfig,
    pub delete: bool,
    pub archive_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub file: String,
    pub format: OutputFormat,
    pub assets_path: String,
    pub external_template: Option<PathBuf>,
}

impl OutputConfig {
    /// Whether reports go to the standard output stream instead of files.
    pub fn is_stdout(&self) -> bool {
        self.file.is_empty() || self.file == "stdout"
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConvertError::Config {
            message: format!("unable to read config file {}: {}", path.display(), e),
        })?;

        let raw: RawConfig = toml::from_str(&contents)?;
        Self::from_document(raw)
    }

    /// Validate and normalize a deserialized document into a run
    /// configuration, compiling all templates.
    pub fn from_document(raw: RawConfig) -> Result<Self> {
        let lookup_limit = if raw.lookup_limit < 1 {
            DEFAULT_LOOKUP_LIMIT
        } else {
            raw.lookup_limit as usize
        };

        if raw.input.dir.as_os_str().is_empty() {
            return Err(config_error("input.dir is not configured"));
        }

        let archive_dir = raw
            .input
            .archive_dir
            .filter(|p| !p.as_os_str().is_empty());

        if raw.input.delete && archive_dir.is_some() {
            return Err(config_error(
                "input.delete and input.archive_dir are mutually exclusive",
            ));
        }

        let dir = raw.input.dir.clean();
        let archive_dir = archive_dir.map(|p| p.clean());
        let external_template = raw
            .output
            .external_template
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.clean());

        if let Some(archive) = &archive_dir {
            if *archive == dir {
                return Err(config_error(
                    "input.dir and input.archive_dir are the same location",
                ));
            }
        }

        let merge_key = raw
            .merge_key
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_MERGE_KEY.to_string());

        let format = raw
            .output
            .format
            .ok_or_else(|| config_error("output.format is not configured"))?;

        let body_source = match format {
            OutputFormat::Txt => Some(TXT_TEMPLATE.to_string()),
            OutputFormat::Html => Some(HTML_TEMPLATE.to_string()),
            OutputFormat::HtmlStatic => Some(HTML_STATIC_TEMPLATE.to_string()),
            OutputFormat::ExternalTemplate => {
                let path = external_template.as_ref().ok_or_else(|| {
                    config_error(
                        "output.external_template must be configured to use external_template output",
                    )
                })?;
                let source = fs::read_to_string(path).map_err(|e| {
                    config_error(format!(
                        "unable to read output.external_template {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Some(source)
            }
            OutputFormat::Json => None,
        };

        let output = OutputConfig {
            file: raw.output.file,
            format,
            assets_path: raw.output.assets_path,
            external_template,
        };

        let filename_source = if output.is_stdout() {
            None
        } else {
            Some(output.file.as_str())
        };

        let templates = TemplateSet::compile(body_source.as_deref(), filename_source, &merge_key)
            .map_err(|e| config_error(format!("unable to compile templates: {}", e)))?;

        // Idempotent; a pre-existing directory is not an error.
        if let Some(archive) = &archive_dir {
            fs::create_dir_all(archive).map_err(|e| {
                config_error(format!(
                    "unable to create input.archive_dir {}: {}",
                    archive.display(),
                    e
                ))
            })?;
        }

        Ok(Config {
            input: InputConfig {
                dir,
                imap: raw.input.imap,
                delete: raw.input.delete,
                archive_dir,
            },
            output,
            lookup_addr: raw.lookup_addr,
            lookup_limit,
            merge_reports: raw.merge_reports,
            log_debug: raw.log_debug,
            log_datetime: raw.log_datetime,
            templates,
        })
    }
}

fn config_error<S: Into<String>>(message: S) -> ConvertError {
    ConvertError::Config {
        message: message.into(),
    }
}
