//! Eager end-to-end ingestion entry point.
//!
//! Runs the full admission pipeline in one call: password-gate encrypted
//! documents, meter billable pages, check the quota, submit the job. Each
//! stage suspends independently so concurrent ingestions in the same process
//! never block one another.
//!
//! ```text
//! files ──▶ secure (encrypted PDFs) ──▶ meter ──▶ quota ──▶ submit ──▶ Job
//! ```
//!
//! Per-file counting problems are warnings inside the returned breakdown;
//! password, quota, endpoint, and submission failures abort the attempt
//! entirely — no partial job state is ever created client-side.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::IngestError;
use crate::job::Job;
use crate::meter::{self, BatchCount, FileFormat, FileInput};
use crate::quota::{self, Admission, QuotaSnapshot, QuotaSource};
use crate::secure;
use crate::submit::{JobSubmitter, Submission};

/// Result of a successful ingestion: the started job plus the metered
/// breakdown (including any per-file warnings) for display.
#[derive(Debug)]
pub struct IngestOutput {
    pub job: Job,
    pub pages: BatchCount,
}

/// Meter, admit, and submit a batch of documents.
///
/// `passwords` maps filenames to user-supplied passwords for encrypted
/// documents; an encrypted PDF without an entry aborts with
/// [`IngestError::PasswordRequired`]. Decryption only happens after the
/// password has been verified, never speculatively.
///
/// # Errors
/// * [`IngestError::PasswordRequired`] / [`IngestError::PasswordIncorrect`] —
///   password gate
/// * [`IngestError::QuotaExceeded`] — admission denied, with the precise
///   reason
/// * [`IngestError::ConfigUnavailable`] / [`IngestError::Network`] /
///   [`IngestError::SubmissionRejected`] — submission aborted
pub async fn ingest(
    files: Vec<FileInput>,
    passwords: &HashMap<String, String>,
    snapshot: &QuotaSnapshot,
    submission: Submission,
    submitter: &JobSubmitter,
    config: &ClientConfig,
) -> Result<IngestOutput, IngestError> {
    info!("starting ingestion of {} files", files.len());

    // ── Step 1: Password-gate encrypted documents ────────────────────────
    let mut cleared = Vec::with_capacity(files.len());
    for file in files {
        if FileFormat::from_name(&file.name) == FileFormat::Pdf
            && secure::is_encrypted(&file.bytes)
        {
            let password =
                passwords
                    .get(&file.name)
                    .ok_or_else(|| IngestError::PasswordRequired {
                        name: file.name.clone(),
                    })?;
            secure::verify(&file.name, file.bytes.clone(), password).await?;
            let bytes = secure::decrypt(&file.name, file.bytes, password).await?;
            cleared.push(FileInput::new(file.name, bytes));
        } else {
            cleared.push(file);
        }
    }

    // ── Step 2: Meter billable pages ─────────────────────────────────────
    let pages = meter::count_batch(cleared, config.meter_concurrency).await;
    for warning in pages.warnings() {
        warn!("{warning}");
    }
    info!("metered batch: {} billable pages", pages.total);

    // ── Step 3: Quota admission ──────────────────────────────────────────
    match quota::admit(snapshot, pages.total) {
        Admission::Allow => {}
        Admission::Deny(reason) => {
            info!("admission denied: {reason}");
            return Err(IngestError::QuotaExceeded { reason });
        }
    }

    // ── Step 4: Submit the job ───────────────────────────────────────────
    let job = submitter.submit(&submission).await?;
    info!("ingestion accepted as job {}", job.id);

    Ok(IngestOutput { job, pages })
}

/// Fetch the account's quota snapshot from `source`, then run [`ingest`].
///
/// Convenience wrapper for callers that hold an account identifier rather
/// than a snapshot.
#[allow(clippy::too_many_arguments)]
pub async fn ingest_for_account(
    files: Vec<FileInput>,
    passwords: &HashMap<String, String>,
    account_id: &str,
    source: &dyn QuotaSource,
    submission: Submission,
    submitter: &JobSubmitter,
    config: &ClientConfig,
) -> Result<IngestOutput, IngestError> {
    let snapshot = source.snapshot(account_id).await?;
    ingest(files, passwords, &snapshot, submission, submitter, config).await
}
