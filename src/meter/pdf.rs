//! PDF page counting from the document's page table.

use crate::error::FileError;

/// Count billable pages: the native page count from the page table.
///
/// Encrypted documents are rejected here — they must go through
/// [`crate::secure`] first so the user gets a password prompt instead of a
/// generic counting failure.
pub(crate) fn count_pages(name: &str, bytes: &[u8]) -> Result<u64, FileError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| FileError::CountFailed {
        name: name.to_string(),
        detail: e.to_string(),
    })?;

    if doc.is_encrypted() {
        return Err(FileError::CountFailed {
            name: name.to_string(),
            detail: "document is encrypted; verify its password first".into(),
        });
    }

    Ok(doc.get_pages().len() as u64)
}
