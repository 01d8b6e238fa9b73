//! Metadata-only "protection" and removal of an existing encryption dictionary.
//!
//! No encryption is written: protected files stay readable by anyone. The
//! password is validated and then discarded.

use std::path::Path;

use lopdf::Document;
use tracing::{info, warn};

use crate::error::PdfMantraError;
use crate::output::ProcessResult;
use crate::pdf::{metadata, writer};

pub const MIN_PASSWORD_LEN: usize = 4;
pub const PRODUCER: &str = "PDF Mantra";

/// Shown to the user after every `protect` job.
pub const ENCRYPTION_NOTICE: &str = "full PDF encryption is not supported; the file was saved \
     with protection metadata only and can still be opened without a password";

/// Empty, mismatched and too-short passwords are rejected, in that order.
pub fn validate_password(password: &str, confirm: &str) -> crate::error::Result<()> {
    if password.is_empty() {
        return Err(PdfMantraError::invalid_input("enter a password"));
    }
    if password != confirm {
        return Err(PdfMantraError::invalid_input("passwords do not match"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PdfMantraError::invalid_input(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Write the protection markers into `/Info`. `file_name` goes into the title.
pub fn protect_document(doc: &mut Document, file_name: &str) -> crate::error::Result<()> {
    metadata::set_text_field(doc, "Title", &format!("Protected: {file_name}"))?;
    metadata::set_text_field(doc, "Subject", "Password Protected Document")?;
    metadata::set_text_field(doc, "Keywords", "protected encrypted")?;
    metadata::set_text_field(doc, "Producer", PRODUCER)?;
    metadata::set_text_field(doc, "Creator", PRODUCER)?;
    Ok(())
}

pub fn protect(
    input: &Path,
    output: &Path,
    password: &str,
    confirm: &str,
) -> crate::error::Result<ProcessResult> {
    validate_password(password, confirm)?;

    let mut doc = super::load_document(input)?;
    protect_document(&mut doc, &super::display_name(input))?;
    let size = writer::save_to_file(&mut doc, output)?;

    warn!(output = %output.display(), "{ENCRYPTION_NOTICE}");
    Ok(ProcessResult::new(output, size))
}

/// Decrypt `doc` with `password` if it is encrypted, then drop `/Encrypt`.
///
/// Returns whether the document was encrypted.
pub fn unlock_document(doc: &mut Document, password: &str) -> crate::error::Result<bool> {
    let encrypted = doc.is_encrypted() || doc.trailer.has(b"Encrypt");
    if doc.is_encrypted() {
        doc.decrypt(password).map_err(|e| {
            PdfMantraError::invalid_input(format!(
                "could not decrypt: wrong password or unsupported encryption ({e})"
            ))
        })?;
    }
    doc.trailer.remove(b"Encrypt");
    Ok(encrypted)
}

pub fn unlock(input: &Path, output: &Path, password: &str) -> crate::error::Result<ProcessResult> {
    if password.is_empty() {
        return Err(PdfMantraError::invalid_input("enter the password"));
    }

    // ページツリーは暗号化されたままだと辿れないため、読み込み時に復号する
    let mut doc = load_with_password(input, password)?;
    let decrypted = unlock_document(&mut doc, password)?;
    let was_encrypted = doc.was_encrypted() || decrypted;
    let size = writer::save_to_file(&mut doc, output)?;

    if was_encrypted {
        info!(input = %input.display(), "removed encryption");
    } else {
        info!(input = %input.display(), "document was not encrypted, saved a copy");
    }
    Ok(ProcessResult::new(output, size))
}

fn load_with_password(input: &Path, password: &str) -> crate::error::Result<Document> {
    Document::load_with_password(input, password).map_err(|e| match e {
        lopdf::Error::InvalidPassword => PdfMantraError::invalid_input(format!(
            "could not decrypt {}: wrong password",
            input.display()
        )),
        other => PdfMantraError::pdf_read(format!("failed to load {}: {other}", input.display())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_rules() {
        assert!(validate_password("", "").is_err());
        assert!(validate_password("secret", "Secret").is_err());
        assert!(validate_password("abc", "abc").is_err());
        assert!(validate_password("abcd", "abcd").is_ok());
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_password("ééé", "ééé").is_err());
        assert!(validate_password("éééé", "éééé").is_ok());
    }

    #[test]
    fn test_mismatch_reported_before_length() {
        let err = validate_password("ab", "cd").unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn test_protect_document_sets_markers() {
        let mut doc = Document::with_version("1.7");
        protect_document(&mut doc, "report.pdf").unwrap();
        let meta = metadata::read_metadata(&doc);
        assert_eq!(meta.title.as_deref(), Some("Protected: report.pdf"));
        assert_eq!(meta.subject.as_deref(), Some("Password Protected Document"));
        assert_eq!(meta.keywords.as_deref(), Some("protected encrypted"));
        assert_eq!(meta.producer.as_deref(), Some("PDF Mantra"));
        assert_eq!(meta.creator.as_deref(), Some("PDF Mantra"));
    }

    #[test]
    fn test_unlock_plain_document_is_noop() {
        let mut doc = Document::with_version("1.7");
        assert!(!unlock_document(&mut doc, "pw").unwrap());
    }
}
