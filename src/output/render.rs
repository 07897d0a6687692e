use crate::config::{Config, OutputFormat};
use crate::dmarc::Report;
use crate::error::{ConvertError, Result};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

/// Renders one report into its output artifact. Constructed fresh per
/// report, borrowing the immutable run configuration.
pub struct Output<'a> {
    cfg: &'a Config,
}

impl<'a> Output<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self { cfg }
    }

    /// Render the report and persist it to the configured destination.
    pub fn write(&self, report: &Report) -> Result<()> {
        let body = self.render(report)?;

        match self.destination(report)? {
            None => {
                io::stdout().write_all(body.as_bytes())?;
            }
            Some(path) => {
                info!(path = %path.display(), "writing report");
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        fs::create_dir_all(parent)?;
                    }
                }
                fs::write(&path, body)?;
            }
        }

        Ok(())
    }

    fn render(&self, report: &Report) -> Result<String> {
        match self.cfg.output.format {
            OutputFormat::Json => {
                let mut body =
                    serde_json::to_string_pretty(report).map_err(|e| ConvertError::Render {
                        message: format!("json encoding failed: {}", e),
                    })?;
                body.push('\n');
                Ok(body)
            }
            _ => self
                .cfg
                .templates
                .render_body(report, &self.cfg.output.assets_path),
        }
    }

    fn destination(&self, report: &Report) -> Result<Option<PathBuf>> {
        if self.cfg.output.is_stdout() {
            return Ok(None);
        }

        let name = self.cfg.templates.render_filename(report)?;
        Ok(Some(PathBuf::from(name)))
    }
}
