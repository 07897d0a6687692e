use crate::config::Config;
use crate::dmarc::{self, Report};
use crate::error::Result;
use crate::mail;
use crate::output::Output;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const EML_EXTENSION: &str = "eml";

/// One source file that made it through extraction and parsing, still
/// correlated with its report.
struct ParsedSource {
    path: PathBuf,
    report: Report,
}

/// Drives one conversion run over the configured input directory: find →
/// convert → (merge) → write → cleanup, in that fixed order. Created per
/// run and discarded afterwards.
pub struct FilesConverter<'a> {
    cfg: &'a Config,
    candidates: Vec<PathBuf>,
    parsed: Vec<ParsedSource>,
}

impl<'a> FilesConverter<'a> {
    pub fn new(cfg: &'a Config) -> Result<Self> {
        if !cfg.input.dir.exists() {
            fs::create_dir_all(&cfg.input.dir)?;
        }

        Ok(Self {
            cfg,
            candidates: Vec::new(),
            parsed: Vec::new(),
        })
    }

    /// Run the whole pipeline. Per-file extraction and parse failures are
    /// logged and skipped; discovery, merge, and render failures abort the
    /// run. Source files are deleted or archived only after every report
    /// was written successfully.
    pub fn convert_write(&mut self) -> Result<()> {
        self.find()?;
        self.convert();

        let (files, mut reports): (Vec<PathBuf>, Vec<Report>) = self
            .parsed
            .drain(..)
            .map(|source| (source.path, source.report))
            .unzip();

        if self.cfg.merge_reports {
            reports = dmarc::group_merge_reports(reports, &self.cfg.templates)?;
            info!(reports = reports.len(), "merged reports");
        }

        self.write(&reports)?;

        if self.cfg.input.delete {
            self.delete(&files);
        } else if let Some(archive_dir) = &self.cfg.input.archive_dir {
            self.archive(&files, archive_dir);
        }

        Ok(())
    }

    /// Discover input files. First pass extracts report attachments out of
    /// `.eml` deliveries (cleaning each consumed `.eml` up immediately);
    /// second pass collects every other top-level file as a parse
    /// candidate, sorted for deterministic output order.
    fn find(&mut self) -> Result<()> {
        let mut eml_files = Vec::new();
        for entry in WalkDir::new(&self.cfg.input.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() && has_extension(entry.path(), EML_EXTENSION) {
                eml_files.push(entry.into_path());
            }
        }

        if !eml_files.is_empty() {
            info!(
                count = eml_files.len(),
                dir = %self.cfg.input.dir.display(),
                "found eml files, extracting attachments"
            );
            for eml in &eml_files {
                match mail::extract_attachment(eml, &self.cfg.input.dir) {
                    Ok(true) => self.cleanup_eml(eml),
                    Ok(false) => {
                        debug!(file = %eml.display(), "no report attachment found")
                    }
                    Err(e) => {
                        warn!(file = %eml.display(), error = %e, "attachment extraction failed, skipping")
                    }
                }
            }
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.cfg.input.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() && !has_extension(entry.path(), EML_EXTENSION) {
                files.push(entry.into_path());
            }
        }
        files.sort();

        info!(
            count = files.len(),
            dir = %self.cfg.input.dir.display(),
            "found input files"
        );
        self.candidates = files;
        Ok(())
    }

    /// Cleanup for a consumed `.eml` file, applied as soon as its
    /// attachment was extracted. Independent of the post-write cleanup of
    /// parsed report files.
    fn cleanup_eml(&self, eml: &Path) {
        if self.cfg.input.delete {
            debug!(file = %eml.display(), "deleting consumed eml file");
            if let Err(e) = fs::remove_file(eml) {
                warn!(file = %eml.display(), error = %e, "unable to delete eml file");
            }
        } else if let Some(archive_dir) = &self.cfg.input.archive_dir {
            let Some(name) = eml.file_name() else { return };
            debug!(file = %eml.display(), "archiving consumed eml file");
            if let Err(e) = fs::rename(eml, archive_dir.join(name)) {
                warn!(file = %eml.display(), error = %e, "unable to archive eml file");
            }
        }
    }

    /// Parse every candidate file, skipping the ones that fail.
    fn convert(&mut self) {
        let mut parsed = Vec::new();

        for path in &self.candidates {
            let file = match File::open(path) {
                Ok(file) => file,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "unable to open input file, skipping");
                    continue;
                }
            };

            let label = path.display().to_string();
            match dmarc::read_parse(file, &label, self.cfg.lookup_addr, self.cfg.lookup_limit) {
                Ok(report) => parsed.push(ParsedSource {
                    path: path.clone(),
                    report,
                }),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "unable to parse report, skipping")
                }
            }
        }

        self.parsed = parsed;
    }

    /// Render every report. The first failure aborts the run.
    fn write(&self, reports: &[Report]) -> Result<()> {
        for report in reports {
            Output::new(self.cfg).write(report)?;
        }
        Ok(())
    }

    fn delete(&self, files: &[PathBuf]) {
        for file in files {
            info!(file = %file.display(), "deleting consumed file");
            if let Err(e) = fs::remove_file(file) {
                warn!(file = %file.display(), error = %e, "unable to delete file, skipping");
            }
        }
    }

    fn archive(&self, files: &[PathBuf], archive_dir: &Path) {
        for file in files {
            let Some(name) = file.file_name() else { continue };
            info!(file = %file.display(), "archiving consumed file");
            if let Err(e) = fs::rename(file, archive_dir.join(name)) {
                warn!(file = %file.display(), error = %e, "unable to archive file, skipping");
            }
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputFormat, RawConfig, RawInput, RawOutput};
    use crate::dmarc::parse::SAMPLE_XML;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn raw_config(input_dir: &Path, format: OutputFormat) -> RawConfig {
        RawConfig {
            input: RawInput {
                dir: input_dir.to_path_buf(),
                ..Default::default()
            },
            output: RawOutput {
                format: Some(format),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn write_sample_report(dir: &Path, name: &str, org: &str, domain: &str) {
        let xml = SAMPLE_XML
            .replace("Example", org)
            .replace("example.com", domain);
        fs::write(dir.join(name), xml).unwrap();
    }

    fn eml_with_report(domain: &str) -> String {
        format!(
            "From: reporter@{domain}\r\n\
             To: dmarc@example.com\r\n\
             Subject: Report Domain: {domain}\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/mixed; boundary=\"b1\"\r\n\
             \r\n\
             --b1\r\n\
             Content-Type: application/xml\r\n\
             Content-Disposition: attachment; filename=\"{domain}.xml\"\r\n\
             \r\n\
             {}\r\n\
             --b1--\r\n",
            SAMPLE_XML.replace("example.com", domain)
        )
    }

    #[test]
    fn test_find_extracts_and_deletes_eml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("delivery.eml"), eml_with_report("example.com")).unwrap();

        let mut raw = raw_config(tmp.path(), OutputFormat::Txt);
        raw.input.delete = true;
        let cfg = Config::from_document(raw).unwrap();

        let mut converter = FilesConverter::new(&cfg).unwrap();
        converter.find().unwrap();

        assert!(!tmp.path().join("delivery.eml").exists());
        assert_eq!(converter.candidates.len(), 1);
        assert!(converter.candidates[0].ends_with("example.com.xml"));
    }

    #[test]
    fn test_find_archives_eml() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("input");
        fs::create_dir(&input).unwrap();
        fs::write(input.join("delivery.eml"), eml_with_report("example.com")).unwrap();

        let mut raw = raw_config(&input, OutputFormat::Txt);
        raw.input.archive_dir = Some(tmp.path().join("archive"));
        let cfg = Config::from_document(raw).unwrap();

        let mut converter = FilesConverter::new(&cfg).unwrap();
        converter.find().unwrap();

        assert!(!input.join("delivery.eml").exists());
        assert!(tmp.path().join("archive/delivery.eml").exists());
    }

    #[test]
    fn test_find_skips_subdirectories() {
        let tmp = TempDir::new().unwrap();
        write_sample_report(tmp.path(), "a.xml", "Example", "example.com");
        let sub = tmp.path().join("nested");
        fs::create_dir(&sub).unwrap();
        write_sample_report(&sub, "b.xml", "Example", "example.com");

        let cfg = Config::from_document(raw_config(tmp.path(), OutputFormat::Txt)).unwrap();
        let mut converter = FilesConverter::new(&cfg).unwrap();
        converter.find().unwrap();

        assert_eq!(converter.candidates.len(), 1);
        assert!(converter.candidates[0].ends_with("a.xml"));
    }

    #[test]
    fn test_convert_isolates_parse_failures() {
        let tmp = TempDir::new().unwrap();
        write_sample_report(tmp.path(), "a.xml", "Example", "example.com");
        write_sample_report(tmp.path(), "b.xml", "Other", "other.example");
        fs::write(tmp.path().join("broken.xml"), "definitely not xml").unwrap();

        let cfg = Config::from_document(raw_config(tmp.path(), OutputFormat::Txt)).unwrap();
        let mut converter = FilesConverter::new(&cfg).unwrap();
        converter.find().unwrap();
        converter.convert();

        assert_eq!(converter.candidates.len(), 3);
        assert_eq!(converter.parsed.len(), 2);
    }

    #[test]
    fn test_merge_combines_same_key_and_archives_both_sources() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("input");
        let out = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        write_sample_report(&input, "a.xml", "Example", "example.com");
        write_sample_report(&input, "b.xml", "Example", "example.com");

        let mut raw = raw_config(&input, OutputFormat::Txt);
        raw.merge_reports = true;
        raw.input.archive_dir = Some(tmp.path().join("archive"));
        raw.output.file = format!("{}/{{{{ report_metadata.org_name }}}}.txt", out.display());
        let cfg = Config::from_document(raw).unwrap();

        let mut converter = FilesConverter::new(&cfg).unwrap();
        converter.convert_write().unwrap();

        // Two source files fed one merged artifact; both sources archived.
        assert!(out.join("Example.txt").exists());
        assert!(tmp.path().join("archive/a.xml").exists());
        assert!(tmp.path().join("archive/b.xml").exists());
        assert!(!input.join("a.xml").exists());
    }

    #[test]
    fn test_render_failure_aborts_before_cleanup() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("input");
        let out = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        // a.xml carries two records, b.xml only one; a template indexing the
        // second record renders the first report and fails on the second.
        write_sample_report(&input, "a.xml", "Example", "example.com");
        let one_record = {
            let xml = SAMPLE_XML.replace("example.com", "other.example");
            let cut = xml.find("  <record>\n    <row>\n      <source_ip>198.51.100.9").unwrap();
            format!("{}</feedback>\n", &xml[..cut])
        };
        fs::write(input.join("b.xml"), one_record).unwrap();

        let mut template = tempfile::NamedTempFile::new().unwrap();
        write!(template, "{{{{ records.1.row.source_ip }}}}").unwrap();

        let mut raw = raw_config(&input, OutputFormat::ExternalTemplate);
        raw.input.delete = true;
        raw.output.external_template = Some(template.path().to_path_buf());
        raw.output.file = format!("{}/{{{{ policy_published.domain }}}}.out", out.display());
        let cfg = Config::from_document(raw).unwrap();

        let mut converter = FilesConverter::new(&cfg).unwrap();
        assert!(converter.convert_write().is_err());

        // The first report was already written when the second failed to
        // render, but no lifecycle action was taken on any source file.
        assert!(out.join("example.com.out").exists());
        assert!(input.join("a.xml").exists());
        assert!(input.join("b.xml").exists());
    }

    #[test]
    fn test_delete_only_touches_parsed_files() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("input");
        let out = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        write_sample_report(&input, "a.xml", "Example", "example.com");
        write_sample_report(&input, "b.xml", "Other", "other.example");
        fs::write(input.join("broken.xml"), "definitely not xml").unwrap();

        let mut raw = raw_config(&input, OutputFormat::Txt);
        raw.input.delete = true;
        raw.output.file = format!("{}/{{{{ policy_published.domain }}}}.txt", out.display());
        let cfg = Config::from_document(raw).unwrap();

        let mut converter = FilesConverter::new(&cfg).unwrap();
        converter.convert_write().unwrap();

        assert!(!input.join("a.xml").exists());
        assert!(!input.join("b.xml").exists());
        assert!(input.join("broken.xml").exists());
        assert!(out.join("example.com.txt").exists());
        assert!(out.join("other.example.txt").exists());
    }

    #[test]
    fn test_new_creates_missing_input_dir() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("not-yet-there");

        let cfg = Config::from_document(raw_config(&input, OutputFormat::Txt)).unwrap();
        FilesConverter::new(&cfg).unwrap();

        assert!(input.is_dir());
    }
}
