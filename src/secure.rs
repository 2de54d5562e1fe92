//! Password gate for encrypted documents.
//!
//! Two-phase contract:
//!
//! 1. [`verify`] — authenticate the password against the document entirely in
//!    memory; nothing decrypted is written out. A wrong password comes back
//!    as the recoverable [`IngestError::PasswordIncorrect`], anything else
//!    (corrupt bytes, unsupported encryption) as the generic
//!    [`IngestError::CorruptDocument`].
//! 2. [`decrypt`] — re-open with the password and re-serialise without
//!    encryption. Only ever call this after [`verify`] has succeeded:
//!    decryption failure modes are less specific than authentication ones,
//!    and a speculative decrypt turns a wrong password into a confusing
//!    corruption error.
//!
//! Both phases parse the whole document and run under `spawn_blocking` so
//! they never stall the async executor.

use tracing::{debug, info};

use crate::error::IngestError;

/// True when the document carries an encryption dictionary.
///
/// Unparseable bytes report `false`; they will surface a proper error from
/// whichever operation touches them next.
pub fn is_encrypted(bytes: &[u8]) -> bool {
    lopdf::Document::load_mem(bytes)
        .map(|doc| doc.is_encrypted())
        .unwrap_or(false)
}

/// Verify `password` against the document and return its page count.
///
/// An unencrypted document verifies trivially, so callers may route every
/// PDF through the gate without special-casing.
pub async fn verify(name: &str, bytes: Vec<u8>, password: &str) -> Result<usize, IngestError> {
    let name = name.to_string();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || verify_blocking(&name, &bytes, &password))
        .await
        .map_err(|e| IngestError::Internal(format!("verification task panicked: {e}")))?
}

fn verify_blocking(name: &str, bytes: &[u8], password: &str) -> Result<usize, IngestError> {
    let mut doc = load(name, bytes)?;
    if doc.is_encrypted() {
        authenticate(&mut doc, name, password)?;
        debug!("password verified for '{}'", name);
    }
    Ok(doc.get_pages().len())
}

/// Re-serialise the document without encryption.
///
/// Must only be invoked after [`verify`] has succeeded for the same bytes
/// and password. An unencrypted input is returned unchanged.
pub async fn decrypt(
    name: &str,
    bytes: Vec<u8>,
    password: &str,
) -> Result<Vec<u8>, IngestError> {
    let name = name.to_string();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || decrypt_blocking(&name, bytes, &password))
        .await
        .map_err(|e| IngestError::Internal(format!("decryption task panicked: {e}")))?
}

fn decrypt_blocking(name: &str, bytes: Vec<u8>, password: &str) -> Result<Vec<u8>, IngestError> {
    let mut doc = load(name, &bytes)?;
    if !doc.is_encrypted() {
        return Ok(bytes);
    }

    authenticate(&mut doc, name, password)?;

    // Decrypted in memory; strip the encryption dictionary so the
    // re-serialised document is a clean, password-free copy.
    doc.trailer.remove(b"Encrypt");

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| IngestError::Internal(format!("re-serialising '{name}': {e}")))?;
    info!("decrypted '{}' ({} bytes)", name, out.len());
    Ok(out)
}

fn load(name: &str, bytes: &[u8]) -> Result<lopdf::Document, IngestError> {
    lopdf::Document::load_mem(bytes).map_err(|e| IngestError::CorruptDocument {
        name: name.to_string(),
        detail: e.to_string(),
    })
}

fn authenticate(
    doc: &mut lopdf::Document,
    name: &str,
    password: &str,
) -> Result<(), IngestError> {
    doc.decrypt(password)
        .map_err(|e| classify_open_failure(name, e.to_string()))
}

/// Split authentication-specific failures from everything else.
///
/// lopdf reports a rejected password in the error text; any other failure
/// (unsupported scheme, broken xref) gets the generic corruption error.
fn classify_open_failure(name: &str, detail: String) -> IngestError {
    if detail.to_lowercase().contains("password") {
        IngestError::PasswordIncorrect {
            name: name.to_string(),
        }
    } else {
        IngestError::CorruptDocument {
            name: name.to_string(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::pdf_with_pages;

    #[tokio::test]
    async fn unencrypted_document_verifies_trivially() {
        let bytes = pdf_with_pages(4);
        let pages = verify("plain.pdf", bytes, "irrelevant").await.unwrap();
        assert_eq!(pages, 4);
    }

    #[tokio::test]
    async fn unencrypted_document_decrypts_to_itself() {
        let bytes = pdf_with_pages(2);
        let out = decrypt("plain.pdf", bytes.clone(), "irrelevant")
            .await
            .unwrap();
        assert_eq!(out, bytes);
    }

    #[tokio::test]
    async fn garbage_bytes_are_corrupt_not_password() {
        let err = verify("junk.pdf", b"not a pdf".to_vec(), "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::CorruptDocument { .. }));
    }

    #[test]
    fn unparseable_bytes_report_not_encrypted() {
        assert!(!is_encrypted(b"not a pdf"));
        assert!(!is_encrypted(&pdf_with_pages(1)));
    }

    #[test]
    fn password_failures_classified_by_error_text() {
        let err = classify_open_failure("doc.pdf", "the supplied password is incorrect".into());
        assert!(matches!(err, IngestError::PasswordIncorrect { .. }));

        let err = classify_open_failure("doc.pdf", "xref table is damaged".into());
        assert!(matches!(err, IngestError::CorruptDocument { .. }));
    }
}
