//! # pagegate
//!
//! Quota-metered document ingestion and asynchronous analysis-job tracking.
//!
//! ## Why this crate?
//!
//! Document analysis backends bill by the "page", but a page means something
//! different in every format — a PDF has a page table, a spreadsheet has
//! rows, an image is one page flat. This crate meters a heterogeneous batch
//! with fixed per-format rules *before* anything is uploaded, gates it
//! against the account's allowance, submits it as an asynchronous job, and
//! converges the client-held job record to the backend's terminal verdict
//! exactly once.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Secure   verify + strip passwords from encrypted PDFs
//!  ├─ 2. Meter    count billable pages per format-specific rule
//!  ├─ 3. Quota    admit or deny against the account's remaining allowance
//!  ├─ 4. Submit   idempotent job creation against the resolved backend
//!  └─ 5. Track    push-channel updates until SUCCEEDED / FAILED
//! ```
//!
//! The backend's base URL is itself discovered at runtime and cached for the
//! process lifetime; see [`endpoint`] for the single-flight and
//! invalidate-and-retry behaviour underlying every submission.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagegate::{meter, quota, ClientConfig, FileInput, JobSubmitter, Submission, TaskKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .discovery_url("https://config.example.com/backend")
//!         .build()?;
//!
//!     let files = vec![FileInput::new("report.pdf", std::fs::read("report.pdf")?)];
//!     let pages = meter::count_batch(files, config.meter_concurrency).await;
//!     println!("batch is {} billable pages", pages.total);
//!
//!     let snapshot = quota::QuotaSnapshot { tier: "pro".into(), allowance: 500, consumed: 120 };
//!     if !quota::admit(&snapshot, pages.total).is_allowed() {
//!         return Ok(()); // render an upgrade prompt instead
//!     }
//!
//!     let submitter = JobSubmitter::new(&config)?;
//!     let job = submitter
//!         .submit(&Submission {
//!             task: TaskKind::Analyze,
//!             zip_url: "https://files.example.com/batch.zip".into(),
//!             session_id: "sess-1".into(),
//!             owner_id: "user-1".into(),
//!         })
//!         .await?;
//!     println!("started job {}", job.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagegate` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pagegate = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod endpoint;
pub mod error;
pub mod ingest;
pub mod job;
pub mod meter;
pub mod quota;
pub mod secure;
pub mod submit;
pub mod track;

#[cfg(test)]
pub(crate) mod testutil;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use endpoint::{Discovery, EndpointResolver, HttpDiscovery};
pub use error::{FileError, IngestError};
pub use ingest::{ingest, ingest_for_account, IngestOutput};
pub use job::{Job, JobStatus, TaskKind};
pub use meter::{BatchCount, FileCount, FileFormat, FileInput};
pub use quota::{Admission, DenyReason, QuotaSnapshot, QuotaSource};
pub use submit::{JobSubmitter, Submission};
pub use track::{track, JobFeed, JobStream, TrackHandle};
