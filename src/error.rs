//! Error types for the pagegate library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`IngestError`] — **Fatal**: the current operation cannot proceed at all
//!   (backend undiscoverable, submission rejected, quota exhausted, wrong
//!   document password). Returned as `Err(IngestError)` from the top-level
//!   entry points.
//!
//! * [`FileError`] — **Non-fatal**: a single file in a batch could not be
//!   counted (corrupt bytes, unrecognised format) but the other files are
//!   fine. Stored inside [`crate::meter::FileCount`] so callers can inspect
//!   partial success rather than losing the whole batch to one bad file.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! file failure, warn and continue, or collect all warnings for display.

use thiserror::Error;

use crate::quota::DenyReason;

/// All fatal errors returned by the pagegate library.
///
/// File-level failures use [`FileError`] and are stored in
/// [`crate::meter::FileCount`] rather than propagated here.
#[derive(Debug, Error)]
pub enum IngestError {
    // ── Endpoint errors ───────────────────────────────────────────────────
    /// Backend endpoint discovery failed and no cached value exists.
    #[error("Processing service is temporarily unavailable: {detail}\nTry again in a moment.")]
    ConfigUnavailable { detail: String },

    /// Transport-level failure talking to the backend, after the one
    /// invalidate-and-retry cycle was exhausted.
    #[error("Network error reaching the processing service: {detail}\nCheck your connection and try again.")]
    Network { detail: String },

    // ── Submission errors ─────────────────────────────────────────────────
    /// The backend explicitly declined the job. `body` is the response body
    /// verbatim so the backend's own detail is never lost.
    #[error("Job submission rejected (HTTP {status}): {body}")]
    SubmissionRejected { status: u16, body: String },

    // ── Quota errors ──────────────────────────────────────────────────────
    /// Admission denied by the quota gate.
    #[error("Quota exceeded: {reason}")]
    QuotaExceeded { reason: DenyReason },

    // ── Document errors ───────────────────────────────────────────────────
    /// A password was supplied but it is wrong.
    #[error("Incorrect password for '{name}'")]
    PasswordIncorrect { name: String },

    /// The document is encrypted and no password was supplied.
    #[error("'{name}' is encrypted and requires a password")]
    PasswordRequired { name: String },

    /// The document could not be opened for a reason other than its password
    /// (corrupt bytes, unsupported encryption scheme).
    #[error("Could not open '{name}': {detail}")]
    CorruptDocument { name: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// True for transport-classified failures.
    ///
    /// [`crate::endpoint::EndpointResolver::with_retry`] invalidates the
    /// cached endpoint and retries exactly once only for these; an explicit
    /// backend rejection or a quota denial is never retried.
    pub fn is_transport(&self) -> bool {
        matches!(self, IngestError::Network { .. })
    }
}

/// A non-fatal error for a single file in a metering batch.
///
/// Stored alongside [`crate::meter::FileCount`] when counting fails or the
/// format is unrecognised. The batch continues and the file is still listed
/// in the breakdown with zero pages.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// Page counting failed for this file.
    #[error("'{name}': page counting failed: {detail}")]
    CountFailed { name: String, detail: String },

    /// The filename extension maps to no billable format. Counted as zero
    /// pages; surfaced as a warning, never dropped from the breakdown.
    #[error("'{name}': unrecognised file format, counted as 0 pages")]
    UnknownFormat { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_rejected_keeps_body_verbatim() {
        let e = IngestError::SubmissionRejected {
            status: 422,
            body: r#"{"error":"unsupported task"}"#.into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("422"), "got: {msg}");
        assert!(msg.contains(r#"{"error":"unsupported task"}"#));
    }

    #[test]
    fn only_network_is_transport() {
        assert!(IngestError::Network {
            detail: "connection reset".into()
        }
        .is_transport());
        assert!(!IngestError::SubmissionRejected {
            status: 500,
            body: String::new()
        }
        .is_transport());
        assert!(!IngestError::ConfigUnavailable {
            detail: "lookup failed".into()
        }
        .is_transport());
    }

    #[test]
    fn password_incorrect_display() {
        let e = IngestError::PasswordIncorrect {
            name: "report.pdf".into(),
        };
        assert!(e.to_string().contains("report.pdf"));
        assert!(e.to_string().contains("Incorrect password"));
    }

    #[test]
    fn unknown_format_display() {
        let e = FileError::UnknownFormat {
            name: "notes.docx".into(),
        };
        assert!(e.to_string().contains("notes.docx"));
        assert!(e.to_string().contains("0 pages"));
    }
}
