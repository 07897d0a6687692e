pub mod cli;
pub mod config;
pub mod convert;
pub mod dmarc;
pub mod error;
pub mod mail;
pub mod output;
pub mod template;

// Public API re-exports
pub use cli::Cli;
pub use config::{Config, ImapConfig, ImapSecurity, OutputFormat, RawConfig, SAMPLE_CONFIG};
pub use convert::FilesConverter;
pub use error::{ConvertError, Result};

// Core functionality re-exports
pub use dmarc::{group_merge_reports, read_parse, Report};
pub use mail::extract_attachment;
pub use output::Output;
pub use template::{TemplateSet, DEFAULT_MERGE_KEY};

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
