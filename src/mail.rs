use crate::error::{ConvertError, Result};
use mail_parser::{MessageParser, MimeHeaders};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Extract DMARC report payloads attached to an email-format file.
///
/// Every attachment that carries a filename and looks like a report payload
/// is written into `dest_dir` under its sanitized base name. Returns whether
/// at least one payload was extracted; the caller decides what happens to
/// the source message based on that.
pub fn extract_attachment(source: &Path, dest_dir: &Path) -> Result<bool> {
    let data = fs::read(source)?;
    let message = MessageParser::default()
        .parse(&data)
        .ok_or_else(|| ConvertError::Mail {
            message: format!("unable to parse message {}", source.display()),
        })?;

    let mut extracted = false;

    for part in message.attachments() {
        let Some(name) = part.attachment_name() else {
            debug!(file = %source.display(), "skipping unnamed attachment");
            continue;
        };

        let contents = part.contents();
        if !looks_like_report(name, contents) {
            debug!(file = %source.display(), attachment = name, "not a report payload, skipping");
            continue;
        }

        let target = dest_dir.join(sanitize_filename(name));
        fs::write(&target, contents)?;
        info!(
            file = %source.display(),
            attachment = name,
            target = %target.display(),
            "extracted report attachment"
        );
        extracted = true;
    }

    Ok(extracted)
}

/// Report payloads arrive as raw XML or as gzip/zip containers; accept by
/// extension first, by content magic as a fallback.
fn looks_like_report(name: &str, contents: &[u8]) -> bool {
    let lower = name.to_lowercase();
    if lower.ends_with(".xml") || lower.ends_with(".gz") || lower.ends_with(".zip") {
        return true;
    }

    contents.starts_with(&[0x1f, 0x8b])
        || contents.starts_with(b"PK\x03\x04")
        || contents.starts_with(b"<?xml")
}

/// Reduce an attachment name to a safe base name: path components are
/// stripped, reserved characters replaced, trailing dots and spaces trimmed.
pub fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);

    let mut sanitized = String::with_capacity(base.len());
    for ch in base.chars() {
        match ch {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => sanitized.push('_'),
            '/' | '\\' => sanitized.push('_'),
            c if c.is_control() => sanitized.push('_'),
            c => sanitized.push(c),
        }
    }

    let sanitized = sanitized.trim_end_matches(&['.', ' '][..]).to_string();

    if sanitized.is_empty() {
        "attachment".to_string()
    } else {
        sanitized
    }
}
